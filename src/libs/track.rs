//! Aggregation of per-job artifacts into genome-wide wiggle tracks.
//!
//! Artifacts of one strand are read in job order. Each event type is split
//! out, its prefix stripped, and the lines appended to that event's track.
//! Coordinates must continue exactly where the previous block stopped; any
//! gap, repeat or truncation fails the whole track.

use crate::libs::error::{Error, Result};
use crate::libs::job::{strand_jobs, JobDescriptor};
use crate::libs::stitch::{EventType, Strand};
use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// One `fixedStep` section of an artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub chrom: String,
    pub start: usize,
    pub acceptor: Vec<String>,
    pub donor: Vec<String>,
}

impl Block {
    pub fn len(&self) -> usize {
        self.acceptor.len()
    }

    pub fn is_empty(&self) -> bool {
        self.acceptor.is_empty()
    }

    pub fn end(&self) -> usize {
        self.start + self.len() - 1
    }

    pub fn header(&self) -> String {
        format!("fixedStep chrom={} start={} step=1", self.chrom, self.start)
    }

    pub fn values(&self, event: EventType) -> &[String] {
        match event {
            EventType::Acceptor => &self.acceptor,
            EventType::Donor => &self.donor,
        }
    }
}

/// Parses `fixedStep chrom=<name> start=<n> step=1`.
pub fn parse_header(text: &str) -> Option<(String, usize)> {
    let mut fields = text.split_whitespace();
    if fields.next()? != "fixedStep" {
        return None;
    }

    let mut chrom = None;
    let mut start = None;
    let mut step = None;
    for field in fields {
        let (key, value) = field.split_once('=')?;
        match key {
            "chrom" => chrom = Some(value.to_string()),
            "start" => start = value.parse::<usize>().ok(),
            "step" => step = value.parse::<usize>().ok(),
            _ => return None,
        }
    }

    match (chrom, start, step) {
        (Some(chrom), Some(start), Some(1)) if start > 0 => Some((chrom, start)),
        _ => None,
    }
}

// A value is a literal `0` or a finite number
fn check_value(text: &str) -> std::result::Result<(), String> {
    if text == "0" {
        return Ok(());
    }
    match text.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(()),
        _ => Err(format!("invalid value [{}]", text)),
    }
}

enum Expect {
    AcceptorHeader,
    DonorHeader(String, usize),
    Acceptor,
    Donor,
    // a full acceptor/donor pair was read
    PairDone,
}

/// Reads and checks the structure of one artifact.
///
/// `label` is only used in error messages.
pub fn read_artifact<R: BufRead>(reader: R, label: &str) -> Result<Vec<Block>> {
    let malformed = |line_no: usize, msg: &str| {
        Error::Aggregation(format!("{} line {}: {}", label, line_no, msg))
    };

    let mut blocks: Vec<Block> = vec![];
    let mut expect = Expect::AcceptorHeader;

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = i + 1;
        let (event, rest) = line
            .split_once('\t')
            .ok_or_else(|| malformed(line_no, "missing event type column"))?;
        let event: EventType = event
            .parse()
            .map_err(|_| malformed(line_no, &format!("unknown event type [{}]", event)))?;
        let is_header = rest.starts_with("fixedStep");

        expect = match (expect, event, is_header) {
            (Expect::AcceptorHeader | Expect::PairDone, EventType::Acceptor, true) => {
                let (chrom, start) = parse_header(rest)
                    .ok_or_else(|| malformed(line_no, &format!("bad header [{}]", rest)))?;
                Expect::DonorHeader(chrom, start)
            }
            (Expect::DonorHeader(chrom, start), EventType::Donor, true) => {
                match parse_header(rest) {
                    Some((c, s)) if c == chrom && s == start => {}
                    _ => {
                        return Err(malformed(
                            line_no,
                            "donor header does not match acceptor header",
                        ))
                    }
                }
                blocks.push(Block {
                    chrom,
                    start,
                    acceptor: vec![],
                    donor: vec![],
                });
                Expect::Acceptor
            }
            (Expect::Acceptor | Expect::PairDone, EventType::Acceptor, false) => {
                check_value(rest).map_err(|msg| malformed(line_no, &msg))?;
                if let Some(block) = blocks.last_mut() {
                    block.acceptor.push(rest.to_string());
                }
                Expect::Donor
            }
            (Expect::Donor, EventType::Donor, false) => {
                check_value(rest).map_err(|msg| malformed(line_no, &msg))?;
                if let Some(block) = blocks.last_mut() {
                    block.donor.push(rest.to_string());
                }
                Expect::PairDone
            }
            _ => return Err(malformed(line_no, "headers misaligned or values out of order")),
        };
    }

    if !matches!(expect, Expect::PairDone) {
        return Err(Error::Aggregation(format!(
            "{}: truncated or empty artifact",
            label
        )));
    }

    Ok(blocks)
}

/// Coordinate bookkeeping across the artifacts of one strand.
#[derive(Debug)]
pub struct TrackCursor {
    sizes: BTreeMap<String, usize>,
    finished: HashSet<String>,
    current: Option<(String, usize)>,
    pub blocks: usize,
    pub positions: usize,
}

impl TrackCursor {
    /// `sizes` holds every sequence the track must cover completely.
    pub fn new(sizes: BTreeMap<String, usize>) -> Self {
        Self {
            sizes,
            finished: HashSet::new(),
            current: None,
            blocks: 0,
            positions: 0,
        }
    }

    fn close_current(&mut self) -> Result<()> {
        if let Some((chrom, end)) = self.current.take() {
            let len = self.sizes[&chrom];
            if end != len {
                return Err(Error::Aggregation(format!(
                    "{} stops at {} but has length {}",
                    chrom, end, len
                )));
            }
            self.finished.insert(chrom);
        }
        Ok(())
    }

    /// Accepts the next block or reports why it cannot follow the previous one.
    pub fn advance(&mut self, block: &Block) -> Result<()> {
        let len = *self.sizes.get(&block.chrom).ok_or_else(|| {
            Error::Aggregation(format!("{} is not a planned sequence", block.chrom))
        })?;

        let continues = matches!(&self.current, Some((chrom, _)) if *chrom == block.chrom);
        if continues {
            let prev_end = self.current.as_ref().map(|(_, end)| *end).unwrap_or(0);
            if block.start != prev_end + 1 {
                return Err(Error::Aggregation(format!(
                    "{}: block starts at {} after previous block ended at {}",
                    block.chrom, block.start, prev_end
                )));
            }
        } else {
            self.close_current()?;
            if self.finished.contains(&block.chrom) {
                return Err(Error::Aggregation(format!(
                    "{} reappears after it was completed",
                    block.chrom
                )));
            }
            if block.start != 1 {
                return Err(Error::Aggregation(format!(
                    "{}: first block starts at {} instead of 1",
                    block.chrom, block.start
                )));
            }
        }

        if block.end() > len {
            return Err(Error::Aggregation(format!(
                "{}: block ends at {} beyond length {}",
                block.chrom,
                block.end(),
                len
            )));
        }

        self.current = Some((block.chrom.clone(), block.end()));
        self.blocks += 1;
        self.positions += block.len();
        Ok(())
    }

    /// Every planned sequence must have been covered end to end.
    pub fn finish(mut self) -> Result<TrackSummary> {
        self.close_current()?;
        let missing: Vec<&String> = self
            .sizes
            .keys()
            .filter(|chrom| !self.finished.contains(*chrom))
            .collect();
        if !missing.is_empty() {
            return Err(Error::Aggregation(format!(
                "no values for {} sequence(s): {:?}",
                missing.len(),
                missing
            )));
        }

        Ok(TrackSummary {
            sequences: self.finished.len(),
            blocks: self.blocks,
            positions: self.positions,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackSummary {
    pub sequences: usize,
    pub blocks: usize,
    pub positions: usize,
}

/// Appends one validated block to the acceptor and donor wiggle tracks.
pub fn write_block<W: Write>(block: &Block, acceptor: &mut W, donor: &mut W) -> std::io::Result<()> {
    for (event, writer) in [(EventType::Acceptor, acceptor), (EventType::Donor, donor)] {
        writeln!(writer, "{}", block.header())?;
        for value in block.values(event) {
            writeln!(writer, "{}", value)?;
        }
    }
    Ok(())
}

/// Output paths of one strand's tracks
pub fn track_path(outdir: &Path, prefix: &str, strand: Strand, event: EventType) -> PathBuf {
    outdir.join(format!("{}.{}.{}.wig", prefix, strand.word(), event.word()))
}

/// Sizes of every sequence the jobs cover
pub fn planned_sizes<'a, I>(jobs: I) -> BTreeMap<String, usize>
where
    I: IntoIterator<Item = &'a JobDescriptor>,
{
    jobs.into_iter()
        .flat_map(|job| job.unit.sequences())
        .map(|rec| (rec.name, rec.len))
        .collect()
}

/// Concatenates the artifacts of one strand into its acceptor and donor tracks.
///
/// `jobs` must all be of `strand`; they are read in id order from
/// `artifact_dir`. Tracks are written to temporary files and moved into place
/// only after every artifact passed, so a failed strand leaves no track.
pub fn aggregate_strand(
    jobs: &[JobDescriptor],
    strand: Strand,
    artifact_dir: &Path,
    outdir: &Path,
    prefix: &str,
) -> Result<TrackSummary> {
    let selected = strand_jobs(jobs, strand);
    if selected.is_empty() {
        return Err(Error::Aggregation(format!("no {} strand jobs", strand)));
    }
    let mut cursor = TrackCursor::new(planned_sizes(selected.iter().copied()));

    let acc_tmp = tempfile::NamedTempFile::new_in(outdir)?;
    let don_tmp = tempfile::NamedTempFile::new_in(outdir)?;
    {
        let mut acc_out = BufWriter::new(acc_tmp.as_file());
        let mut don_out = BufWriter::new(don_tmp.as_file());

        for job in &selected {
            let path = artifact_dir.join(job.artifact_name());
            let file = File::open(&path).map_err(|e| {
                Error::Aggregation(format!("missing artifact {}: {}", path.display(), e))
            })?;
            let blocks = read_artifact(BufReader::new(file), &job.artifact_name())?;

            let expected = job.unit.output_len();
            let got: usize = blocks.iter().map(|b| b.len()).sum();
            if got != expected {
                return Err(Error::Aggregation(format!(
                    "{} holds {} positions, its unit covers {}",
                    job.artifact_name(),
                    got,
                    expected
                )));
            }

            for block in &blocks {
                cursor.advance(block)?;
                write_block(block, &mut acc_out, &mut don_out)?;
            }
        }

        acc_out.flush()?;
        don_out.flush()?;
    }
    let summary = cursor.finish()?;

    for (tmp, event) in [(acc_tmp, EventType::Acceptor), (don_tmp, EventType::Donor)] {
        tmp.persist(track_path(outdir, prefix, strand, event))
            .map_err(|e| Error::Io(e.error))?;
    }

    Ok(summary)
}
