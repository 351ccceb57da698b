use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

fn write_genome(dir: &std::path::Path) -> anyhow::Result<std::path::PathBuf> {
    let path = dir.join("genome.fa");
    std::fs::write(
        &path,
        ">chr1\nACGTACGTACGTACGTACGTACGTA\n>chrM\nGGATCCA\n",
    )?;
    Ok(path)
}

#[test]
fn command_jobs_strand_order() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let genome = write_genome(temp.path())?;

    let mut cmd = cargo_bin_cmd!("splicewig");
    let output = cmd
        .arg("jobs")
        .arg(&genome)
        .arg("--chunk")
        .arg("10")
        .arg("--overlap")
        .arg("3")
        .output()?;
    let stdout = String::from_utf8(output.stdout)?;
    let lines: Vec<&str> = stdout.lines().collect();

    // chr1 => 3 ranges, chrM => 1 batch, two strands
    assert!(output.status.success());
    assert_eq!(lines.len(), 8);
    assert!(lines[..4].iter().all(|l| l.contains(r#""strand":"+""#)));
    assert!(lines[4..].iter().all(|l| l.contains(r#""strand":"-""#)));

    for (i, line) in lines.iter().enumerate() {
        assert!(line.contains(&format!(r#""id":{},"#, i % 4)));
    }
    assert!(lines[0].contains(r#""kind":"range""#));
    assert!(lines[3].contains(r#""kind":"batch""#));
    assert!(lines[0].contains(r#""resolution":3"#));

    Ok(())
}

#[test]
fn command_jobs_from_sizes() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let sizes = temp.path().join("chrom.sizes");
    std::fs::write(&sizes, "chr1\t20000000\nchrM\t16569\n")?;

    let mut cmd = cargo_bin_cmd!("splicewig");
    let output = cmd
        .arg("jobs")
        .arg("genome.2bit")
        .arg("--sizes")
        .arg(&sizes)
        .output()?;
    let stdout = String::from_utf8(output.stdout)?;

    assert!(output.status.success());
    assert_eq!(stdout.lines().count(), 10);
    assert!(stdout
        .lines()
        .all(|l| l.contains(r#""reference":"genome.2bit""#)));

    Ok(())
}

#[test]
fn command_jobs_commands() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let genome = write_genome(temp.path())?;
    let jobs = temp.path().join("jobs.jsonl");
    let commands = temp.path().join("jobs.sh");

    let mut cmd = cargo_bin_cmd!("splicewig");
    cmd.arg("jobs")
        .arg(&genome)
        .arg("--chunk")
        .arg("10")
        .arg("--overlap")
        .arg("3")
        .arg("-o")
        .arg(&jobs)
        .arg("--commands")
        .arg(&commands)
        .arg("--scorer")
        .arg("my-model --gpu")
        .arg("--outdir")
        .arg("results")
        .assert()
        .success();

    let content = std::fs::read_to_string(&commands)?;
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 8);
    assert!(lines[0].contains(" score "));
    assert!(lines[0].ends_with("--id 0 --strand plus --scorer 'my-model --gpu' --outdir 'results'"));
    assert!(lines[7].contains("--id 3 --strand minus"));

    Ok(())
}

#[test]
fn command_jobs_commands_need_outfile() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let genome = write_genome(temp.path())?;

    let mut cmd = cargo_bin_cmd!("splicewig");
    cmd.arg("jobs")
        .arg(&genome)
        .arg("--commands")
        .arg(temp.path().join("jobs.sh"))
        .assert()
        .failure();

    Ok(())
}

#[test]
fn command_jobs_duplicate_names() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let sizes = temp.path().join("chrom.sizes");
    std::fs::write(&sizes, "chr1\t100\nchr1\t200\n")?;

    let mut cmd = cargo_bin_cmd!("splicewig");
    cmd.arg("jobs")
        .arg("genome.2bit")
        .arg("--sizes")
        .arg(&sizes)
        .assert()
        .failure();

    Ok(())
}

#[cfg(unix)]
#[test]
fn command_jobs_commands_run_in_sh() -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new()?;
    let run_dir = temp.path().join("my run");
    std::fs::create_dir_all(&run_dir)?;
    let genome = write_genome(&run_dir)?;
    let jobs = run_dir.join("jobs.jsonl");
    let commands = run_dir.join("jobs.sh");
    let results = run_dir.join("bob's results");

    let scorer = temp.path().join("scorer.sh");
    std::fs::write(
        &scorer,
        r#"#!/bin/sh
awk 'NR == 2 { for (i = 1; i <= length($0); i++) printf "0.5\t0.25\n" }'
"#,
    )?;
    std::fs::set_permissions(&scorer, std::fs::Permissions::from_mode(0o755))?;

    let mut cmd = cargo_bin_cmd!("splicewig");
    cmd.arg("jobs")
        .arg(&genome)
        .arg("--chunk")
        .arg("10")
        .arg("--overlap")
        .arg("3")
        .arg("-o")
        .arg(&jobs)
        .arg("--commands")
        .arg(&commands)
        .arg("--scorer")
        .arg(&scorer)
        .arg("--outdir")
        .arg(&results)
        .assert()
        .success();

    let content = std::fs::read_to_string(&commands)?;
    let line = content.lines().nth(3).unwrap();
    let status = std::process::Command::new("sh").arg("-c").arg(line).status()?;

    assert!(status.success());
    assert!(results.join("plus.000003.tsv").exists());

    Ok(())
}
