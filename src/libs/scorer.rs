use crate::libs::stitch::ScoredOutput;
use anyhow::{anyhow, bail, Context};
use std::io::{BufRead, Write};
use std::process::{Command, Stdio};

/// Splice-site model: one acceptor and one donor probability per input base.
pub trait Scorer: Sync {
    fn score(&self, name: &str, seq: &[u8]) -> anyhow::Result<ScoredOutput>;
}

/// Runs an external program per window.
///
/// The window goes to stdin as a single FASTA record; stdout must hold one
/// `acceptor<TAB>donor` line per base.
#[derive(Debug, Clone)]
pub struct CommandScorer {
    program: String,
    args: Vec<String>,
}

impl CommandScorer {
    /// `command` is split on whitespace; the program must be on `PATH` or be
    /// a path to an existing file.
    pub fn new(command: &str) -> anyhow::Result<Self> {
        let mut parts = command.split_whitespace().map(|s| s.to_string());
        let program = parts
            .next()
            .ok_or_else(|| anyhow!("Empty scorer command"))?;

        let resolved = which::which(&program)
            .with_context(|| format!("Scorer program not found: {}", program))?;

        Ok(Self {
            program: resolved.display().to_string(),
            args: parts.collect(),
        })
    }
}

impl Scorer for CommandScorer {
    fn score(&self, name: &str, seq: &[u8]) -> anyhow::Result<ScoredOutput> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to run scorer {}", self.program))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| anyhow!("Scorer stdin unavailable"))?;

        // Feed stdin from another thread so a chatty scorer can't deadlock on
        // a full stdout pipe
        let output = std::thread::scope(|s| {
            let feeder = s.spawn(move || -> std::io::Result<()> {
                stdin.write_all(b">")?;
                stdin.write_all(name.as_bytes())?;
                stdin.write_all(b"\n")?;
                stdin.write_all(seq)?;
                stdin.write_all(b"\n")?;
                Ok(())
            });
            let output = child.wait_with_output();
            let fed = feeder
                .join()
                .map_err(|_| anyhow!("Scorer input thread panicked"))?;
            let output = output?;
            if output.status.success() {
                fed?;
            }
            anyhow::Ok(output)
        })?;

        if !output.status.success() {
            bail!(
                "Scorer {} failed on {} ({}): {}",
                self.program,
                name,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        parse_scores(output.stdout.as_slice())
            .with_context(|| format!("Invalid scorer output for {}", name))
    }
}

/// Parses `acceptor<TAB>donor` lines.
pub fn parse_scores<R: BufRead>(reader: R) -> anyhow::Result<ScoredOutput> {
    let mut scored = ScoredOutput::default();

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let mut fields = line.split('\t');
        let (acc, don) = match (fields.next(), fields.next(), fields.next()) {
            (Some(a), Some(d), None) => (a, d),
            _ => bail!("line {}: expected 2 columns, got [{}]", i + 1, line),
        };

        let parse = |s: &str| -> anyhow::Result<f32> {
            let v = s
                .trim()
                .parse::<f32>()
                .map_err(|e| anyhow!("line {}: [{}] {}", i + 1, s, e))?;
            if !v.is_finite() {
                bail!("line {}: non-finite value [{}]", i + 1, s);
            }
            Ok(v)
        };
        scored.acceptor.push(parse(acc)?);
        scored.donor.push(parse(don)?);
    }

    Ok(scored)
}
