//! Random access to `.2bit` genomes.
//!
//! Only what fetching needs is decoded: the index, each record's length and
//! N-blocks, and the packed bases of the requested interval. Soft-mask blocks
//! are skipped, so returned bases are always upper case.

use anyhow::{anyhow, Result};
use indexmap::IndexMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::ops::Range;
use std::path::Path;

const TWOBIT_MAGIC: u32 = 0x1A412743;
const TWOBIT_MAGIC_SWAPPED: u32 = 0x4327411A;

const BASES: [u8; 4] = [b'T', b'C', b'A', b'G'];

/// Per-record header, read once and cached
#[derive(Debug, Clone)]
struct RecordInfo {
    dna_size: usize,
    n_blocks: Vec<Range<usize>>,
    packed_offset: u64,
}

#[derive(Debug)]
pub struct TwoBitFile<R> {
    reader: R,
    is_swapped: bool,
    offsets: IndexMap<String, u64>,
    records: IndexMap<String, RecordInfo>,
}

impl TwoBitFile<BufReader<File>> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())
            .map_err(|e| anyhow!("could not open {}: {}", path.as_ref().display(), e))?;
        Self::new(BufReader::new(file))
    }
}

impl<R: Read + Seek> TwoBitFile<R> {
    pub fn new(mut reader: R) -> Result<Self> {
        let mut buf = [0u8; 4];
        reader.read_exact(&mut buf)?;
        let is_swapped = match u32::from_ne_bytes(buf) {
            TWOBIT_MAGIC => false,
            TWOBIT_MAGIC_SWAPPED => true,
            magic => return Err(anyhow!("Not a valid 2bit file (magic: {:x})", magic)),
        };

        let version = read_u32(&mut reader, is_swapped)?;
        if version != 0 && version != 1 {
            return Err(anyhow!("Unsupported 2bit version: {}", version));
        }
        let seq_count = read_u32(&mut reader, is_swapped)?;
        let _reserved = read_u32(&mut reader, is_swapped)?;

        let mut offsets = IndexMap::new();
        for _ in 0..seq_count {
            let mut len_buf = [0u8; 1];
            reader.read_exact(&mut len_buf)?;
            let mut name_buf = vec![0u8; len_buf[0] as usize];
            reader.read_exact(&mut name_buf)?;
            let name = String::from_utf8(name_buf)?;

            // version 1 stores 64-bit offsets
            let offset = if version == 1 {
                read_u64(&mut reader, is_swapped)?
            } else {
                read_u32(&mut reader, is_swapped)? as u64
            };
            offsets.insert(name, offset);
        }

        Ok(Self {
            reader,
            is_swapped,
            offsets,
            records: IndexMap::new(),
        })
    }

    /// Names in file order
    pub fn names(&self) -> Vec<String> {
        self.offsets.keys().cloned().collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.offsets.contains_key(name)
    }

    fn record(&mut self, name: &str) -> Result<RecordInfo> {
        if let Some(info) = self.records.get(name) {
            return Ok(info.clone());
        }

        let offset = *self
            .offsets
            .get(name)
            .ok_or_else(|| anyhow!("Sequence not found: {}", name))?;
        self.reader.seek(SeekFrom::Start(offset))?;

        let dna_size = read_u32(&mut self.reader, self.is_swapped)? as usize;
        let n_blocks = self.read_blocks()?;
        // soft-mask blocks, unused
        let _ = self.read_blocks()?;
        let _reserved = read_u32(&mut self.reader, self.is_swapped)?;
        let packed_offset = self.reader.stream_position()?;

        let info = RecordInfo {
            dna_size,
            n_blocks,
            packed_offset,
        };
        self.records.insert(name.to_string(), info.clone());
        Ok(info)
    }

    fn read_blocks(&mut self) -> Result<Vec<Range<usize>>> {
        let count = read_u32(&mut self.reader, self.is_swapped)? as usize;
        let mut starts = Vec::with_capacity(count);
        for _ in 0..count {
            starts.push(read_u32(&mut self.reader, self.is_swapped)? as usize);
        }
        let mut blocks = Vec::with_capacity(count);
        for start in starts {
            let size = read_u32(&mut self.reader, self.is_swapped)? as usize;
            blocks.push(start..start + size);
        }
        Ok(blocks)
    }

    pub fn sequence_len(&mut self, name: &str) -> Result<usize> {
        Ok(self.record(name)?.dna_size)
    }

    /// Bases of the 0-based half-open interval `start..end`.
    pub fn read_range(&mut self, name: &str, start: usize, end: usize) -> Result<Vec<u8>> {
        let info = self.record(name)?;
        if start > end || end > info.dna_size {
            return Err(anyhow!(
                "{}: range {}..{} outside 0..{}",
                name,
                start,
                end,
                info.dna_size
            ));
        }
        if start == end {
            return Ok(vec![]);
        }

        let first_byte = start / 4;
        let last_byte = (end - 1) / 4;
        self.reader
            .seek(SeekFrom::Start(info.packed_offset + first_byte as u64))?;
        let mut packed = vec![0u8; last_byte - first_byte + 1];
        self.reader.read_exact(&mut packed)?;

        let mut seq: Vec<u8> = (start..end)
            .map(|i| {
                let byte = packed[i / 4 - first_byte];
                let shift = 6 - 2 * (i % 4);
                BASES[((byte >> shift) & 3) as usize]
            })
            .collect();

        for block in info
            .n_blocks
            .iter()
            .filter(|b| b.start < end && b.end > start)
        {
            let lo = block.start.max(start) - start;
            let hi = block.end.min(end) - start;
            seq[lo..hi].fill(b'N');
        }

        Ok(seq)
    }
}

fn read_u32<R: Read>(reader: &mut R, is_swapped: bool) -> Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    let val = u32::from_ne_bytes(buf);
    Ok(if is_swapped { val.swap_bytes() } else { val })
}

fn read_u64<R: Read>(reader: &mut R, is_swapped: bool) -> Result<u64> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    let val = u64::from_ne_bytes(buf);
    Ok(if is_swapped { val.swap_bytes() } else { val })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Cursor;

    /// Version 0 file with one record per `(name, seq)`; `N` runs become
    /// N-blocks and lower case is ignored.
    pub(crate) fn build_2bit(records: &[(&str, &str)]) -> Vec<u8> {
        let header_len = 16 + records.iter().map(|(n, _)| 1 + n.len() + 4).sum::<usize>();

        let mut bodies = vec![];
        for (_, seq) in records {
            let seq = seq.to_ascii_uppercase().into_bytes();
            let mut n_blocks: Vec<(u32, u32)> = vec![];
            for (i, b) in seq.iter().enumerate() {
                if *b == b'N' {
                    match n_blocks.last_mut() {
                        Some((s, l)) if (*s + *l) as usize == i => *l += 1,
                        _ => n_blocks.push((i as u32, 1)),
                    }
                }
            }

            let mut body = vec![];
            body.extend_from_slice(&(seq.len() as u32).to_ne_bytes());
            body.extend_from_slice(&(n_blocks.len() as u32).to_ne_bytes());
            for (s, _) in &n_blocks {
                body.extend_from_slice(&s.to_ne_bytes());
            }
            for (_, l) in &n_blocks {
                body.extend_from_slice(&l.to_ne_bytes());
            }
            body.extend_from_slice(&0u32.to_ne_bytes()); // mask blocks
            body.extend_from_slice(&0u32.to_ne_bytes()); // reserved

            for chunk in seq.chunks(4) {
                let mut byte = 0u8;
                for (j, b) in chunk.iter().enumerate() {
                    let code = match b {
                        b'C' => 1,
                        b'A' => 2,
                        b'G' => 3,
                        _ => 0,
                    };
                    byte |= code << (6 - 2 * j);
                }
                body.push(byte);
            }
            bodies.push(body);
        }

        let mut data = vec![];
        data.extend_from_slice(&TWOBIT_MAGIC.to_ne_bytes());
        data.extend_from_slice(&0u32.to_ne_bytes());
        data.extend_from_slice(&(records.len() as u32).to_ne_bytes());
        data.extend_from_slice(&0u32.to_ne_bytes());

        let mut offset = header_len;
        for ((name, _), body) in records.iter().zip(bodies.iter()) {
            data.push(name.len() as u8);
            data.extend_from_slice(name.as_bytes());
            data.extend_from_slice(&(offset as u32).to_ne_bytes());
            offset += body.len();
        }
        for body in bodies {
            data.extend(body);
        }
        data
    }

    #[test]
    fn test_read_range() -> Result<()> {
        let data = build_2bit(&[("seq1", "TCAGGATTACA"), ("seq2", "ACNNNNGT")]);
        let mut tb = TwoBitFile::new(Cursor::new(data))?;

        assert_eq!(tb.names(), vec!["seq1", "seq2"]);
        assert_eq!(tb.sequence_len("seq1")?, 11);
        assert_eq!(tb.read_range("seq1", 0, 11)?, b"TCAGGATTACA".to_vec());
        assert_eq!(tb.read_range("seq1", 3, 7)?, b"GGAT".to_vec());
        assert_eq!(tb.read_range("seq2", 1, 7)?, b"CNNNNG".to_vec());
        assert!(tb.read_range("seq1", 5, 12).is_err());
        assert!(tb.read_range("nope", 0, 1).is_err());

        Ok(())
    }

    #[test]
    fn test_bad_magic() {
        let res = TwoBitFile::new(Cursor::new(vec![0u8; 16]));
        assert!(res.unwrap_err().to_string().contains("Not a valid 2bit file"));
    }
}
