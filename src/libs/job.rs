use crate::libs::plan::WorkUnit;
use crate::libs::stitch::{StitchParams, Strand};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};

/// Everything a worker needs to score and stitch one unit on one strand.
///
/// `id` is the unit's position in the plan. Together with the strand it names
/// the result artifact and fixes the artifact's place in aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDescriptor {
    pub id: usize,
    pub strand: Strand,
    pub reference: String,
    pub unit: WorkUnit,
    pub params: StitchParams,
}

impl JobDescriptor {
    pub fn artifact_name(&self) -> String {
        format!("{}.{:06}.tsv", self.strand.word(), self.id)
    }

    /// Short human-readable label, e.g. `+000003`
    pub fn label(&self) -> String {
        format!("{}{:06}", self.strand, self.id)
    }
}

/// Builds the job list: all `+` jobs in plan order, then all `-` jobs.
///
/// ```
/// use splicewig::libs::job::generate;
/// use splicewig::libs::plan::{plan, PlanOptions, SeqRecord};
/// use splicewig::libs::stitch::{StitchParams, Strand};
///
/// let units = plan(&[SeqRecord::new("chr1", 250)], &PlanOptions {
///     chunk: 100, overlap: 10, ..Default::default()
/// }).unwrap();
/// let jobs = generate(&units, "genome.2bit", &StitchParams::default());
///
/// assert_eq!(jobs.len(), 6);
/// assert_eq!(jobs[2].strand, Strand::Plus);
/// assert_eq!(jobs[3].strand, Strand::Minus);
/// assert_eq!(jobs[3].id, 0);
/// ```
pub fn generate(units: &[WorkUnit], reference: &str, params: &StitchParams) -> Vec<JobDescriptor> {
    let per_strand = |strand: Strand| -> Vec<JobDescriptor> {
        units
            .iter()
            .enumerate()
            .map(|(id, unit)| JobDescriptor {
                id,
                strand,
                reference: reference.to_string(),
                unit: unit.clone(),
                params: *params,
            })
            .collect()
    };

    let mut jobs = per_strand(Strand::Plus);
    jobs.extend(per_strand(Strand::Minus));
    jobs
}

/// One JSON object per line
pub fn write_jobs<W: Write>(writer: &mut W, jobs: &[JobDescriptor]) -> anyhow::Result<()> {
    for job in jobs {
        serde_json::to_writer(&mut *writer, job)?;
        writer.write_all(b"\n")?;
    }
    Ok(())
}

pub fn read_jobs<R: BufRead>(reader: R) -> anyhow::Result<Vec<JobDescriptor>> {
    let mut jobs = vec![];
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let job: JobDescriptor = serde_json::from_str(&line)
            .map_err(|e| anyhow::anyhow!("job list line {}: {}", i + 1, e))?;
        jobs.push(job);
    }
    Ok(jobs)
}

/// Jobs of one strand, ordered by id
pub fn strand_jobs(jobs: &[JobDescriptor], strand: Strand) -> Vec<&JobDescriptor> {
    let mut selected: Vec<&JobDescriptor> = jobs.iter().filter(|j| j.strand == strand).collect();
    selected.sort_by_key(|j| j.id);
    selected
}

// POSIX single quotes; an embedded `'` becomes `'\''`
fn shell_quote(word: &str) -> String {
    format!("'{}'", word.replace('\'', r"'\''"))
}

/// Worker invocation for an external scheduler.
///
/// Every free-form word is single-quoted for `sh`.
pub fn command_line(
    job: &JobDescriptor,
    exe: &str,
    job_file: &str,
    scorer: &str,
    outdir: &str,
) -> String {
    format!(
        "{} score {} --id {} --strand {} --scorer {} --outdir {}",
        shell_quote(exe),
        shell_quote(job_file),
        job.id,
        job.strand.word(),
        shell_quote(scorer),
        shell_quote(outdir)
    )
}
