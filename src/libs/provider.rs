use crate::libs::error::Error;
use crate::libs::plan::SeqRecord;
use crate::libs::stitch::Strand;
use crate::libs::twobit::TwoBitFile;
use indexmap::IndexMap;
use std::fs::File;
use std::io::BufReader;
use std::sync::Mutex;

/// Source of reference sequences.
///
/// Coordinates are 1-based and inclusive. `-` returns the reverse complement
/// of the same interval. One provider is shared by all worker threads.
pub trait SequenceProvider: Sync {
    /// Names and lengths, in the reference's own order
    fn records(&self) -> anyhow::Result<Vec<SeqRecord>>;

    fn fetch(&self, name: &str, start: usize, end: usize, strand: Strand)
        -> anyhow::Result<Vec<u8>>;
}

/// Picks a provider by extension: `.2bit`, otherwise (gzipped) FASTA.
pub fn open_provider(path: &str) -> anyhow::Result<Box<dyn SequenceProvider>> {
    if path.ends_with(".2bit") {
        Ok(Box::new(TwoBitProvider::open(path)?))
    } else {
        Ok(Box::new(FastaProvider::open(path)?))
    }
}

fn check_interval(name: &str, start: usize, end: usize, len: usize) -> Result<(), Error> {
    if start == 0 || start > end || end > len {
        return Err(Error::Fetch(format!(
            "{}:{}-{} is outside [1, {}]",
            name, start, end, len
        )));
    }
    Ok(())
}

fn oriented(seq: Vec<u8>, strand: Strand) -> Vec<u8> {
    match strand {
        Strand::Plus => seq,
        Strand::Minus => reverse_complement(&seq),
    }
}

pub fn reverse_complement(seq: &[u8]) -> Vec<u8> {
    seq.iter()
        .rev()
        .map(|b| match b {
            b'A' => b'T',
            b'a' => b't',
            b'C' => b'G',
            b'c' => b'g',
            b'G' => b'C',
            b'g' => b'c',
            b'T' => b'A',
            b't' => b'a',
            b'U' => b'A',
            b'u' => b'a',
            _ => *b,
        })
        .collect()
}

/// A single seekable handle; concurrent fetches take turns on it.
pub struct TwoBitProvider {
    file: Mutex<TwoBitFile<BufReader<File>>>,
}

impl TwoBitProvider {
    pub fn open(path: &str) -> anyhow::Result<Self> {
        Ok(Self {
            file: Mutex::new(TwoBitFile::open(path)?),
        })
    }

    fn file(&self) -> anyhow::Result<std::sync::MutexGuard<'_, TwoBitFile<BufReader<File>>>> {
        self.file
            .lock()
            .map_err(|_| anyhow::anyhow!("2bit reader poisoned by a panicked job"))
    }
}

impl SequenceProvider for TwoBitProvider {
    fn records(&self) -> anyhow::Result<Vec<SeqRecord>> {
        let mut file = self.file()?;
        let mut records = vec![];
        for name in file.names() {
            let len = file.sequence_len(&name)?;
            records.push(SeqRecord { name, len });
        }
        Ok(records)
    }

    fn fetch(
        &self,
        name: &str,
        start: usize,
        end: usize,
        strand: Strand,
    ) -> anyhow::Result<Vec<u8>> {
        let seq = {
            let mut file = self.file()?;
            if !file.contains(name) {
                return Err(Error::Fetch(format!("{} not found in the 2bit file", name)).into());
            }
            let len = file.sequence_len(name)?;
            check_interval(name, start, end, len)?;
            file.read_range(name, start - 1, end)?
        };
        Ok(oriented(seq, strand))
    }
}

/// Whole FASTA held in memory, upper-cased.
pub struct FastaProvider {
    seqs: IndexMap<String, Vec<u8>>,
}

impl FastaProvider {
    pub fn open(path: &str) -> anyhow::Result<Self> {
        let reader = crate::reader(path)?;
        let mut fa_in = noodles_fasta::io::Reader::new(reader);

        let mut seqs = IndexMap::new();
        for result in fa_in.records() {
            let record = result?;
            let name = String::from_utf8(record.name().into())?;
            let seq = record.sequence().as_ref().to_ascii_uppercase();
            seqs.insert(name, seq);
        }

        Ok(Self { seqs })
    }

    pub fn from_records(records: &[(&str, &str)]) -> Self {
        Self {
            seqs: records
                .iter()
                .map(|(n, s)| (n.to_string(), s.as_bytes().to_ascii_uppercase()))
                .collect(),
        }
    }
}

impl SequenceProvider for FastaProvider {
    fn records(&self) -> anyhow::Result<Vec<SeqRecord>> {
        Ok(self
            .seqs
            .iter()
            .map(|(name, seq)| SeqRecord::new(name, seq.len()))
            .collect())
    }

    fn fetch(
        &self,
        name: &str,
        start: usize,
        end: usize,
        strand: Strand,
    ) -> anyhow::Result<Vec<u8>> {
        let seq = self
            .seqs
            .get(name)
            .ok_or_else(|| Error::Fetch(format!("{} not found in the FASTA file", name)))?;
        check_interval(name, start, end, seq.len())?;

        Ok(oriented(seq[start - 1..end].to_vec(), strand))
    }
}
