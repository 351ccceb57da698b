#![cfg(unix)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// Prints `0.5<TAB>0.25` for every base of the record on stdin
fn write_scorer(dir: &Path) -> anyhow::Result<PathBuf> {
    let path = dir.join("scorer.sh");
    std::fs::write(
        &path,
        r#"#!/bin/sh
awk 'NR == 2 { for (i = 1; i <= length($0); i++) printf "0.5\t0.25\n" }'
"#,
    )?;
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))?;
    Ok(path)
}

// chr1: 3 ranges, chrM: 1 batch
fn prepare_jobs(dir: &Path) -> anyhow::Result<PathBuf> {
    let genome = dir.join("genome.fa");
    std::fs::write(
        &genome,
        ">chr1\nACGTACGTACGTACGTACGTACGTA\n>chrM\nGGATCCA\n",
    )?;
    let jobs = dir.join("jobs.jsonl");

    let mut cmd = cargo_bin_cmd!("splicewig");
    cmd.arg("jobs")
        .arg(&genome)
        .arg("--chunk")
        .arg("10")
        .arg("--overlap")
        .arg("3")
        .arg("-o")
        .arg(&jobs)
        .assert()
        .success();

    Ok(jobs)
}

fn score_all(jobs: &Path, scorer: &Path, outdir: &Path) -> anyhow::Result<()> {
    for strand in ["+", "-"] {
        for id in 0..4 {
            let mut cmd = cargo_bin_cmd!("splicewig");
            cmd.arg("score")
                .arg(jobs)
                .arg("--id")
                .arg(id.to_string())
                .arg("--strand")
                .arg(strand)
                .arg("--scorer")
                .arg(scorer)
                .arg("--outdir")
                .arg(outdir)
                .assert()
                .success();
        }
    }
    Ok(())
}

#[test]
fn command_score_artifact() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let jobs = prepare_jobs(temp.path())?;
    let scorer = write_scorer(temp.path())?;
    let results = temp.path().join("results");

    let mut cmd = cargo_bin_cmd!("splicewig");
    cmd.arg("score")
        .arg(&jobs)
        .arg("--id")
        .arg("3")
        .arg("--strand")
        .arg("+")
        .arg("--scorer")
        .arg(&scorer)
        .arg("--outdir")
        .arg(&results)
        .assert()
        .success();

    let content = std::fs::read_to_string(results.join("plus.000003.tsv"))?;
    assert_eq!(
        content.lines().take(4).collect::<Vec<_>>(),
        vec![
            "acceptor\tfixedStep chrom=chrM start=1 step=1",
            "donor\tfixedStep chrom=chrM start=1 step=1",
            "acceptor\t0.500",
            "donor\t0",
        ]
    );
    assert_eq!(content.lines().count(), 2 + 7 * 2);

    Ok(())
}

#[test]
fn command_score_unknown_job() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let jobs = prepare_jobs(temp.path())?;
    let scorer = write_scorer(temp.path())?;

    let mut cmd = cargo_bin_cmd!("splicewig");
    cmd.arg("score")
        .arg(&jobs)
        .arg("--id")
        .arg("99")
        .arg("--strand")
        .arg("-")
        .arg("--scorer")
        .arg(&scorer)
        .arg("--outdir")
        .arg(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));

    Ok(())
}

#[test]
fn command_aggregate_both_strands() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let jobs = prepare_jobs(temp.path())?;
    let scorer = write_scorer(temp.path())?;
    let results = temp.path().join("results");
    let tracks = temp.path().join("tracks");
    score_all(&jobs, &scorer, &results)?;

    let mut cmd = cargo_bin_cmd!("splicewig");
    cmd.arg("aggregate")
        .arg(&jobs)
        .arg("--artifacts")
        .arg(&results)
        .arg("--outdir")
        .arg(&tracks)
        .arg("--prefix")
        .arg("test")
        .assert()
        .success();

    let sizes = std::fs::read_to_string(tracks.join("chrom.sizes"))?;
    assert_eq!(sizes, "chr1\t25\nchrM\t7\n");

    for strand in ["plus", "minus"] {
        for event in ["acceptor", "donor"] {
            let path = tracks.join(format!("test.{}.{}.wig", strand, event));
            let content = std::fs::read_to_string(&path)?;
            // 4 headers, 32 values
            assert_eq!(content.lines().count(), 36);
            assert_eq!(content.matches("fixedStep").count(), 4);
            assert!(content.contains("fixedStep chrom=chr1 start=11 step=1\n"));
            // one synthesized zero per sequence
            assert_eq!(content.lines().filter(|l| *l == "0").count(), 2);
        }
    }

    // plus acceptor: the last base of chr1 has no downstream neighbour
    let content = std::fs::read_to_string(tracks.join("test.plus.acceptor.wig"))?;
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines[0], "fixedStep chrom=chr1 start=1 step=1");
    assert_eq!(lines[1], "0.500");
    assert_eq!(lines[27], "0");
    assert_eq!(lines[28], "fixedStep chrom=chrM start=1 step=1");

    // minus acceptor: the first base of chr1 has no upstream neighbour
    let content = std::fs::read_to_string(tracks.join("test.minus.acceptor.wig"))?;
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines[1], "0");
    assert_eq!(lines[27], "0.500");

    Ok(())
}

#[test]
fn command_aggregate_missing_artifact() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let jobs = prepare_jobs(temp.path())?;
    let scorer = write_scorer(temp.path())?;
    let results = temp.path().join("results");
    let tracks = temp.path().join("tracks");
    score_all(&jobs, &scorer, &results)?;

    std::fs::remove_file(results.join("minus.000001.tsv"))?;

    let mut cmd = cargo_bin_cmd!("splicewig");
    cmd.arg("aggregate")
        .arg(&jobs)
        .arg("--artifacts")
        .arg(&results)
        .arg("--outdir")
        .arg(&tracks)
        .assert()
        .failure()
        .stderr(predicate::str::contains("minus.000001.tsv"));

    // the plus strand is unaffected
    assert!(tracks.join("splice.plus.acceptor.wig").exists());
    assert!(tracks.join("splice.plus.donor.wig").exists());
    assert!(!tracks.join("splice.minus.acceptor.wig").exists());
    assert!(!tracks.join("splice.minus.donor.wig").exists());

    Ok(())
}

#[test]
fn command_aggregate_truncated_artifact() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let jobs = prepare_jobs(temp.path())?;
    let scorer = write_scorer(temp.path())?;
    let results = temp.path().join("results");
    score_all(&jobs, &scorer, &results)?;

    let path = results.join("plus.000000.tsv");
    let content = std::fs::read_to_string(&path)?;
    let truncated: String = content.lines().take(5).map(|l| format!("{}\n", l)).collect();
    std::fs::write(&path, truncated)?;

    let mut cmd = cargo_bin_cmd!("splicewig");
    cmd.arg("aggregate")
        .arg(&jobs)
        .arg("--artifacts")
        .arg(&results)
        .arg("--outdir")
        .arg(temp.path())
        .arg("--strand")
        .arg("+")
        .assert()
        .failure();

    assert!(!temp.path().join("splice.plus.acceptor.wig").exists());

    Ok(())
}

#[test]
fn command_aggregate_bad_value() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let jobs = prepare_jobs(temp.path())?;
    let scorer = write_scorer(temp.path())?;
    let results = temp.path().join("results");
    let tracks = temp.path().join("tracks");
    score_all(&jobs, &scorer, &results)?;

    let path = results.join("plus.000001.tsv");
    let content = std::fs::read_to_string(&path)?;
    let edited: String = content
        .lines()
        .enumerate()
        .map(|(i, l)| if i == 4 { "acceptor\tGARBAGE\n".to_string() } else { format!("{}\n", l) })
        .collect();
    std::fs::write(&path, edited)?;

    let mut cmd = cargo_bin_cmd!("splicewig");
    cmd.arg("aggregate")
        .arg(&jobs)
        .arg("--artifacts")
        .arg(&results)
        .arg("--outdir")
        .arg(&tracks)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value [GARBAGE]"));

    assert!(!tracks.join("splice.plus.acceptor.wig").exists());
    assert!(!tracks.join("splice.plus.donor.wig").exists());
    assert!(tracks.join("splice.minus.acceptor.wig").exists());
    assert!(tracks.join("splice.minus.donor.wig").exists());

    Ok(())
}
