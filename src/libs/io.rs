use crate::libs::error::{Error, Result};
use crate::libs::plan::SeqRecord;
use std::io::{BufRead, BufReader, BufWriter, Write};

/// Opens `stdin` or a file, transparently decompressing `.gz`.
///
/// ```
/// use std::io::BufRead;
/// let dir = tempfile::tempdir().unwrap();
/// let path = dir.path().join("chr.sizes");
/// std::fs::write(&path, "chr1\t100\nchr2\t50\n").unwrap();
///
/// let reader = splicewig::reader(path.to_str().unwrap()).unwrap();
/// assert_eq!(reader.lines().count(), 2);
/// ```
pub fn reader(input: &str) -> anyhow::Result<Box<dyn BufRead>> {
    let reader: Box<dyn BufRead> = if input == "stdin" {
        Box::new(BufReader::new(std::io::stdin()))
    } else {
        let path = std::path::Path::new(input);
        let file = std::fs::File::open(path)
            .map_err(|why| anyhow::anyhow!("could not open {}: {}", path.display(), why))?;

        if path.extension() == Some(std::ffi::OsStr::new("gz")) {
            Box::new(BufReader::new(flate2::read::MultiGzDecoder::new(file)))
        } else {
            Box::new(BufReader::new(file))
        }
    };

    Ok(reader)
}

pub fn writer(output: &str) -> anyhow::Result<Box<dyn Write>> {
    let writer: Box<dyn Write> = if output == "stdout" {
        Box::new(BufWriter::new(std::io::stdout()))
    } else {
        let file = std::fs::File::create(output)
            .map_err(|why| anyhow::anyhow!("could not create {}: {}", output, why))?;
        Box::new(BufWriter::new(file))
    };

    Ok(writer)
}

/// Parses a `chrom.sizes` style index: `name<TAB>length` per line.
///
/// Blank lines and `#` comments are skipped. Anything else that does not
/// parse is a planning error, since the plan cannot be trusted without it.
pub fn parse_sizes<R: BufRead>(reader: R) -> Result<Vec<SeqRecord>> {
    let mut records = vec![];

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim_end();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut fields = line.split('\t');
        let (name, len) = match (fields.next(), fields.next()) {
            (Some(name), Some(len)) if !name.is_empty() => (name, len),
            _ => {
                return Err(Error::Planning(format!(
                    "line {}: expected <name>\\t<length>, got [{}]",
                    i + 1,
                    line
                )))
            }
        };
        let len = len.trim().parse::<usize>().map_err(|e| {
            Error::Planning(format!("line {}: invalid length [{}]: {}", i + 1, len, e))
        })?;

        records.push(SeqRecord::new(name, len));
    }

    Ok(records)
}

pub fn read_sizes(input: &str) -> anyhow::Result<Vec<SeqRecord>> {
    let reader = reader(input)
        .map_err(|e| Error::Planning(format!("unreadable size index: {}", e)))?;
    Ok(parse_sizes(reader)?)
}

pub fn write_sizes<W: Write>(writer: &mut W, records: &[SeqRecord]) -> std::io::Result<()> {
    for rec in records {
        writeln!(writer, "{}\t{}", rec.name, rec.len)?;
    }
    Ok(())
}
