//! Trimming scored windows back to their output intervals.
//!
//! The scorer reports, for every base of a fetched window, an acceptor and a
//! donor probability. Tracks place the two events one base apart from the
//! scored base:
//!
//! * `+` strand: donor at `p` is read from base `p - 1`, acceptor at `p` from
//!   base `p + 1`.
//! * `-` strand: the vectors are first reversed into reference order, then the
//!   roles swap. Acceptor at `p` comes from `p - 1`, donor at `p` from `p + 1`.
//!
//! At the first base of a sequence the lead-in value is a synthesized zero; at
//! the last base the trailing value is trimmed and replaced by a zero, so each
//! event yields exactly one value per output position.

use crate::libs::error::{Error, Result};
use crate::libs::plan::{BatchUnit, RangeUnit, SeqRecord, WorkUnit};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Strand {
    #[serde(rename = "+")]
    Plus,
    #[serde(rename = "-")]
    Minus,
}

impl Strand {
    pub const BOTH: [Strand; 2] = [Strand::Plus, Strand::Minus];

    pub fn symbol(&self) -> &'static str {
        match self {
            Strand::Plus => "+",
            Strand::Minus => "-",
        }
    }

    /// File-name friendly form
    pub fn word(&self) -> &'static str {
        match self {
            Strand::Plus => "plus",
            Strand::Minus => "minus",
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl FromStr for Strand {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "+" | "plus" => Ok(Strand::Plus),
            "-" | "minus" => Ok(Strand::Minus),
            _ => Err(anyhow::anyhow!("Unknown strand: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Acceptor,
    Donor,
}

impl EventType {
    pub const BOTH: [EventType; 2] = [EventType::Acceptor, EventType::Donor];

    pub fn word(&self) -> &'static str {
        match self {
            EventType::Acceptor => "acceptor",
            EventType::Donor => "donor",
        }
    }
}

impl FromStr for EventType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "acceptor" => Ok(EventType::Acceptor),
            "donor" => Ok(EventType::Donor),
            _ => Err(anyhow::anyhow!("Unknown event type: {}", s)),
        }
    }
}

/// Raw scorer output, aligned base-by-base with the fetched sequence as it
/// was handed to the scorer (reverse-complemented for `-`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoredOutput {
    pub acceptor: Vec<f32>,
    pub donor: Vec<f32>,
}

impl ScoredOutput {
    pub fn len(&self) -> usize {
        self.acceptor.len()
    }

    pub fn is_empty(&self) -> bool {
        self.acceptor.is_empty()
    }

    /// Constant-valued output of `len` bases
    pub fn constant(len: usize, acceptor: f32, donor: f32) -> Self {
        Self {
            acceptor: vec![acceptor; len],
            donor: vec![donor; len],
        }
    }
}

/// Number formatting of the canonical stream.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StitchParams {
    /// Fractional digits kept
    pub resolution: usize,
    /// Values below are written as a literal `0`
    pub floor: f64,
}

impl Default for StitchParams {
    fn default() -> Self {
        Self {
            resolution: 3,
            floor: 0.001,
        }
    }
}

impl StitchParams {
    pub fn render(&self, value: f32) -> String {
        if value < self.floor as f32 {
            "0".to_string()
        } else {
            format!("{:.*}", self.resolution, value)
        }
    }
}

/// Trimmed values of one sequence interval, starting at `start`.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub chrom: String,
    pub start: usize,
    pub acceptor: Vec<f32>,
    pub donor: Vec<f32>,
}

impl Segment {
    pub fn len(&self) -> usize {
        self.acceptor.len()
    }

    pub fn is_empty(&self) -> bool {
        self.acceptor.is_empty()
    }

    pub fn end(&self) -> usize {
        self.start + self.len() - 1
    }

    pub fn values(&self, event: EventType) -> &[f32] {
        match event {
            EventType::Acceptor => &self.acceptor,
            EventType::Donor => &self.donor,
        }
    }
}

/// The stitched result of one job.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalStream {
    pub segments: Vec<Segment>,
    pub params: StitchParams,
}

impl CanonicalStream {
    pub fn len(&self) -> usize {
        self.segments.iter().map(|s| s.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Writes the per-job artifact.
    ///
    /// Each segment opens with an acceptor and a donor `fixedStep` header, then
    /// alternates `acceptor` and `donor` lines, one pair per position.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for seg in &self.segments {
            for event in EventType::BOTH {
                writeln!(
                    writer,
                    "{}\tfixedStep chrom={} start={} step=1",
                    event.word(),
                    seg.chrom,
                    seg.start
                )?;
            }
            for (acc, don) in seg.acceptor.iter().zip(seg.donor.iter()) {
                writeln!(writer, "acceptor\t{}", self.params.render(*acc))?;
                writeln!(writer, "donor\t{}", self.params.render(*don))?;
            }
        }
        Ok(())
    }
}

/// Stitches the scorer output of one job.
///
/// A range unit takes exactly one [`ScoredOutput`]; a batch unit takes one per
/// member, in member order.
pub fn stitch(
    scored: &[ScoredOutput],
    unit: &WorkUnit,
    strand: Strand,
    params: &StitchParams,
) -> Result<CanonicalStream> {
    let segments = match unit {
        WorkUnit::Range(range) => {
            if scored.len() != 1 {
                return Err(Error::Stitch(format!(
                    "range unit {}:{}-{} expects one scored window, got {}",
                    range.name,
                    range.fetch_start,
                    range.fetch_end,
                    scored.len()
                )));
            }
            vec![stitch_range(&scored[0], range, strand)?]
        }
        WorkUnit::Batch(batch) => stitch_batch(scored, batch, strand)?,
    };

    Ok(CanonicalStream {
        segments,
        params: *params,
    })
}

fn check_len(scored: &ScoredOutput, expected: usize, label: &str) -> Result<()> {
    if scored.acceptor.len() != expected || scored.donor.len() != expected {
        return Err(Error::Stitch(format!(
            "{}: expected {} scored positions, got acceptor={} donor={}",
            label,
            expected,
            scored.acceptor.len(),
            scored.donor.len()
        )));
    }
    Ok(())
}

fn reversed(values: &[f32]) -> Vec<f32> {
    values.iter().rev().copied().collect()
}

// Values at reference positions `[from, to]` of a vector whose first element
// sits at `offset`. An empty range is `to == from - 1`.
fn positions(values: &[f32], offset: usize, from: usize, to: usize) -> Result<&[f32]> {
    let lo = from as isize - offset as isize;
    let hi = to as isize - offset as isize + 1;

    if lo < 0 {
        return Err(Error::Stitch(format!(
            "negative index {} (position {} before window start {})",
            lo, from, offset
        )));
    }
    if hi < lo || hi as usize > values.len() {
        return Err(Error::Stitch(format!(
            "positions {}-{} fall outside the scored window {}-{}",
            from,
            to,
            offset,
            offset + values.len() - 1
        )));
    }

    Ok(&values[lo as usize..hi as usize])
}

// Value at `p` taken from `p - 1`, zero at the first base of the sequence.
fn lead_in(values: &[f32], offset: usize, range: &RangeUnit) -> Result<Vec<f32>> {
    let mut out = Vec::with_capacity(range.output_len());
    if range.at_seq_start() {
        out.push(0.0);
        out.extend_from_slice(positions(values, offset, 1, range.output_end - 1)?);
    } else {
        out.extend_from_slice(positions(
            values,
            offset,
            range.output_start - 1,
            range.output_end - 1,
        )?);
    }
    Ok(out)
}

// Value at `p` taken from `p + 1`, zero at the last base of the sequence.
fn trail_out(values: &[f32], offset: usize, range: &RangeUnit) -> Result<Vec<f32>> {
    let mut out = Vec::with_capacity(range.output_len());
    if range.at_seq_end() {
        out.extend_from_slice(positions(
            values,
            offset,
            range.output_start + 1,
            range.output_end,
        )?);
        out.push(0.0);
    } else {
        out.extend_from_slice(positions(
            values,
            offset,
            range.output_start + 1,
            range.output_end + 1,
        )?);
    }
    Ok(out)
}

/// Trims a padded window down to the unit's output interval.
pub fn stitch_range(scored: &ScoredOutput, range: &RangeUnit, strand: Strand) -> Result<Segment> {
    if range.fetch_start == 0
        || range.fetch_start > range.output_start
        || range.output_start > range.output_end
        || range.output_end > range.fetch_end
        || range.fetch_end > range.seq_len
    {
        return Err(Error::Stitch(format!(
            "malformed interval for {}: fetch {}-{}, output {}-{}, length {}",
            range.name,
            range.fetch_start,
            range.fetch_end,
            range.output_start,
            range.output_end,
            range.seq_len
        )));
    }
    check_len(
        scored,
        range.fetch_len(),
        &format!("{}:{}-{}", range.name, range.fetch_start, range.fetch_end),
    )?;

    let offset = range.fetch_start;
    let (acceptor, donor) = match strand {
        Strand::Plus => (
            trail_out(&scored.acceptor, offset, range)?,
            lead_in(&scored.donor, offset, range)?,
        ),
        Strand::Minus => (
            lead_in(&reversed(&scored.acceptor), offset, range)?,
            trail_out(&reversed(&scored.donor), offset, range)?,
        ),
    };

    Ok(Segment {
        chrom: range.name.clone(),
        start: range.output_start,
        acceptor,
        donor,
    })
}

/// A whole sequence is both the start and the end of its own coordinate space,
/// so one context position is dropped at one physical end and a zero appended
/// at the other.
pub fn stitch_whole(scored: &ScoredOutput, rec: &SeqRecord, strand: Strand) -> Result<Segment> {
    check_len(scored, rec.len, &rec.name)?;
    if rec.len == 0 {
        return Err(Error::Stitch(format!("sequence [{}] is empty", rec.name)));
    }

    let drop_first = |values: &[f32]| {
        let mut v = values[1..].to_vec();
        v.push(0.0);
        v
    };
    let drop_last = |values: &[f32]| {
        let mut v = Vec::with_capacity(values.len());
        v.push(0.0);
        v.extend_from_slice(&values[..values.len() - 1]);
        v
    };

    let (acceptor, donor) = match strand {
        Strand::Plus => (drop_first(&scored.acceptor), drop_last(&scored.donor)),
        Strand::Minus => (
            drop_last(&reversed(&scored.acceptor)),
            drop_first(&reversed(&scored.donor)),
        ),
    };

    Ok(Segment {
        chrom: rec.name.clone(),
        start: 1,
        acceptor,
        donor,
    })
}

fn stitch_batch(scored: &[ScoredOutput], batch: &BatchUnit, strand: Strand) -> Result<Vec<Segment>> {
    if scored.len() != batch.members.len() {
        return Err(Error::Stitch(format!(
            "batch of {} sequences got {} scored windows",
            batch.members.len(),
            scored.len()
        )));
    }

    batch
        .members
        .iter()
        .zip(scored.iter())
        .map(|(rec, s)| stitch_whole(s, rec, strand))
        .collect()
}
