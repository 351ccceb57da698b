//! Chunk planning.
//!
//! Sequences are split into work units. Long sequences become a series of
//! [`RangeUnit`]s whose fetch windows overlap by a fixed margin; short ones are
//! packed whole into [`BatchUnit`]s. All coordinates are 1-based and inclusive.

use crate::libs::error::{Error, Result};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeqRecord {
    pub name: String,
    pub len: usize,
}

impl SeqRecord {
    pub fn new(name: &str, len: usize) -> Self {
        Self {
            name: name.to_string(),
            len,
        }
    }
}

/// A sub-interval of one sequence.
///
/// `fetch_*` is what gets scored, `output_*` is what survives stitching.
/// `seq_len` is the upper bound of the sequence's coordinate space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeUnit {
    pub name: String,
    pub seq_len: usize,
    pub fetch_start: usize,
    pub fetch_end: usize,
    pub output_start: usize,
    pub output_end: usize,
}

impl RangeUnit {
    pub fn fetch_len(&self) -> usize {
        self.fetch_end - self.fetch_start + 1
    }

    pub fn output_len(&self) -> usize {
        self.output_end - self.output_start + 1
    }

    /// Output starts at the first base of the sequence
    pub fn at_seq_start(&self) -> bool {
        self.output_start == 1
    }

    /// Output ends at the last base of the sequence
    pub fn at_seq_end(&self) -> bool {
        self.output_end == self.seq_len
    }
}

/// Short sequences processed whole, sharing one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchUnit {
    pub members: Vec<SeqRecord>,
}

impl BatchUnit {
    pub fn total_len(&self) -> usize {
        self.members.iter().map(|m| m.len).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum WorkUnit {
    Range(RangeUnit),
    Batch(BatchUnit),
}

impl WorkUnit {
    /// Sequences touched by this unit, with their full lengths
    pub fn sequences(&self) -> Vec<SeqRecord> {
        match self {
            WorkUnit::Range(r) => vec![SeqRecord::new(&r.name, r.seq_len)],
            WorkUnit::Batch(b) => b.members.clone(),
        }
    }

    /// Number of positions this unit contributes to a track
    pub fn output_len(&self) -> usize {
        match self {
            WorkUnit::Range(r) => r.output_len(),
            WorkUnit::Batch(b) => b.total_len(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            WorkUnit::Range(_) => "range",
            WorkUnit::Batch(_) => "batch",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanOptions {
    pub chunk: usize,
    pub overlap: usize,
    pub min_size: usize,
    pub max_batch: usize,
    pub seed: u64,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            chunk: 6_000_000,
            overlap: 50_000,
            min_size: 1,
            max_batch: 100,
            seed: 42,
        }
    }
}

impl PlanOptions {
    pub fn validate(&self) -> Result<()> {
        if self.chunk == 0 {
            return Err(Error::Planning("chunk size must be positive".to_string()));
        }
        if self.max_batch == 0 {
            return Err(Error::Planning(
                "maximum batch count must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Splits sequences into work units.
///
/// Range units of all long sequences come first, in shuffled sequence order,
/// followed by the batch units. Identical input and seed give an identical
/// list, whatever order `seqs` arrives in.
///
/// ```
/// use splicewig::libs::plan::*;
///
/// let seqs = vec![SeqRecord::new("chr1", 250), SeqRecord::new("chrM", 16)];
/// let opt = PlanOptions { chunk: 100, overlap: 5, min_size: 1, max_batch: 10, seed: 42 };
/// let units = plan(&seqs, &opt).unwrap();
///
/// assert_eq!(units.len(), 4);
/// assert!(matches!(units[3], WorkUnit::Batch(_)));
/// ```
pub fn plan(seqs: &[SeqRecord], opt: &PlanOptions) -> Result<Vec<WorkUnit>> {
    opt.validate()?;

    let mut seen = HashSet::new();
    for rec in seqs {
        if rec.len == 0 {
            return Err(Error::Planning(format!("sequence [{}] has zero length", rec.name)));
        }
        if !seen.insert(rec.name.as_str()) {
            return Err(Error::Planning(format!("duplicated sequence name [{}]", rec.name)));
        }
    }

    let kept: Vec<SeqRecord> = seqs
        .iter()
        .filter(|rec| rec.len >= opt.min_size)
        .cloned()
        .collect();
    let shuffled = permute(kept, opt.seed);

    let (long, short): (Vec<SeqRecord>, Vec<SeqRecord>) =
        shuffled.into_iter().partition(|rec| rec.len >= opt.chunk);

    // interior chunk boundaries need at least one base of context
    if opt.overlap == 0 {
        if let Some(rec) = long.iter().find(|rec| rec.len > opt.chunk) {
            return Err(Error::Planning(format!(
                "overlap must be positive to split [{}] ({} bp) into chunks of {}",
                rec.name, rec.len, opt.chunk
            )));
        }
    }

    let mut units: Vec<WorkUnit> = long
        .iter()
        .flat_map(|rec| split_ranges(rec, opt.chunk, opt.overlap))
        .map(WorkUnit::Range)
        .collect();
    units.extend(
        pack_batches(short, opt.chunk, opt.max_batch)
            .into_iter()
            .map(WorkUnit::Batch),
    );

    Ok(units)
}

/// Seeded permutation of `records`.
///
/// Records are sorted by name first so the result depends only on the set of
/// records and the seed.
pub fn permute(mut records: Vec<SeqRecord>, seed: u64) -> Vec<SeqRecord> {
    records.sort_by(|a, b| a.name.cmp(&b.name));
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    records.shuffle(&mut rng);
    records
}

/// Consecutive `chunk`-sized output intervals covering `[1, len]`, each with a
/// fetch interval padded by `overlap` and clamped to the sequence.
pub fn split_ranges(rec: &SeqRecord, chunk: usize, overlap: usize) -> Vec<RangeUnit> {
    (1..=rec.len)
        .step_by(chunk)
        .map(|output_start| {
            let output_end = (output_start + chunk - 1).min(rec.len);
            RangeUnit {
                name: rec.name.clone(),
                seq_len: rec.len,
                fetch_start: output_start.saturating_sub(overlap).max(1),
                fetch_end: output_end.saturating_add(overlap).min(rec.len),
                output_start,
                output_end,
            }
        })
        .collect()
}

#[derive(Debug, Default)]
struct BatchAcc {
    done: Vec<BatchUnit>,
    current: Vec<SeqRecord>,
    size: usize,
}

// A batch closes as soon as it holds `max_batch` members or its cumulative
// length passes `chunk`; the member that crossed the line stays in it.
fn push_member(acc: BatchAcc, rec: SeqRecord, chunk: usize, max_batch: usize) -> BatchAcc {
    let BatchAcc {
        mut done,
        mut current,
        size,
    } = acc;

    let size = size + rec.len;
    current.push(rec);

    if current.len() >= max_batch || size > chunk {
        done.push(BatchUnit { members: current });
        BatchAcc {
            done,
            current: vec![],
            size: 0,
        }
    } else {
        BatchAcc {
            done,
            current,
            size,
        }
    }
}

/// Packs short sequences into batches, preserving their order.
pub fn pack_batches(records: Vec<SeqRecord>, chunk: usize, max_batch: usize) -> Vec<BatchUnit> {
    let acc = records
        .into_iter()
        .fold(BatchAcc::default(), |acc, rec| {
            push_member(acc, rec, chunk, max_batch)
        });

    let mut done = acc.done;
    if !acc.current.is_empty() {
        done.push(BatchUnit {
            members: acc.current,
        });
    }
    done
}
