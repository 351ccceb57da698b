use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

// Minimal version 0 .2bit file, no N or mask blocks
fn build_2bit(seqs: &[(&str, &str)]) -> Vec<u8> {
    let pack = |seq: &str| -> Vec<u8> {
        seq.as_bytes()
            .chunks(4)
            .map(|chunk| {
                let mut byte = 0u8;
                for i in 0..4 {
                    let code = match chunk.get(i) {
                        Some(b'C') => 1,
                        Some(b'A') => 2,
                        Some(b'G') => 3,
                        _ => 0,
                    };
                    byte |= code << (6 - 2 * i);
                }
                byte
            })
            .collect()
    };

    let mut out = vec![];
    out.extend_from_slice(&0x1A412743u32.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&(seqs.len() as u32).to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());

    let index_len: usize = seqs.iter().map(|(n, _)| 1 + n.len() + 4).sum();
    let mut offset = 16 + index_len;
    let mut records = vec![];
    for (name, seq) in seqs {
        out.push(name.len() as u8);
        out.extend_from_slice(name.as_bytes());
        out.extend_from_slice(&(offset as u32).to_le_bytes());

        let mut rec = vec![];
        rec.extend_from_slice(&(seq.len() as u32).to_le_bytes());
        rec.extend_from_slice(&0u32.to_le_bytes());
        rec.extend_from_slice(&0u32.to_le_bytes());
        rec.extend_from_slice(&0u32.to_le_bytes());
        rec.extend(pack(seq));
        offset += rec.len();
        records.push(rec);
    }
    for rec in records {
        out.extend(rec);
    }
    out
}

#[test]
fn command_size_fasta() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let input = temp.path().join("genome.fa");
    std::fs::write(&input, ">chr1\nACGTACGTAC\nACGT\n>chrM\nacgtn\n")?;

    let mut cmd = cargo_bin_cmd!("splicewig");
    let output = cmd.arg("size").arg(&input).output()?;
    let stdout = String::from_utf8(output.stdout)?;

    assert!(output.status.success());
    assert_eq!(stdout, "chr1\t14\nchrM\t5\n");

    Ok(())
}

#[test]
fn command_size_2bit() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let input = temp.path().join("genome.2bit");
    std::fs::write(
        &input,
        build_2bit(&[("chr1", "ACGTACGTAC"), ("chr2", "GGGCCCAAATTT")]),
    )?;
    let outfile = temp.path().join("chrom.sizes");

    let mut cmd = cargo_bin_cmd!("splicewig");
    cmd.arg("size")
        .arg(&input)
        .arg("-o")
        .arg(&outfile)
        .assert()
        .success();

    let content = std::fs::read_to_string(&outfile)?;
    assert_eq!(content, "chr1\t10\nchr2\t12\n");

    Ok(())
}

#[test]
fn command_size_missing_file() -> anyhow::Result<()> {
    let mut cmd = cargo_bin_cmd!("splicewig");
    cmd.arg("size")
        .arg("tests/no_such_genome.2bit")
        .assert()
        .failure();

    Ok(())
}

#[test]
fn command_invalid() -> anyhow::Result<()> {
    let mut cmd = cargo_bin_cmd!("splicewig");
    cmd.arg("foobar")
        .assert()
        .failure()
        .stderr(predicate::str::contains("recognized"));

    Ok(())
}
