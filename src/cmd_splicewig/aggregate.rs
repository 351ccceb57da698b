use clap::*;
use splicewig::libs::job::{read_jobs, JobDescriptor};
use splicewig::libs::plan::SeqRecord;
use splicewig::libs::stitch::Strand;
use splicewig::libs::track::{aggregate_strand, planned_sizes};
use std::io::Write;
use std::path::Path;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("aggregate")
        .about("Concatenate job artifacts into genome-wide wiggle tracks")
        .after_help(
            r###"
This command runs after every job has finished. For each strand it reads the
artifacts in job order and writes two fixedStep wiggle tracks:

    <outdir>/<prefix>.plus.acceptor.wig
    <outdir>/<prefix>.plus.donor.wig
    <outdir>/<prefix>.minus.acceptor.wig
    <outdir>/<prefix>.minus.donor.wig

and <outdir>/chrom.sizes for converting them to an indexed binary format.

Checks:
* Every job of the strand has its artifact
* Headers come in acceptor/donor pairs and values alternate
* Coordinates continue without gaps or repeats and reach each sequence's end

A strand that fails a check gets no tracks; the other strand is still written.
The command exits non-zero if any strand failed.

Examples:
1. Both strands:
   splicewig aggregate jobs.jsonl --artifacts results --outdir tracks

2. Only the minus strand:
   splicewig aggregate jobs.jsonl --artifacts results --strand -

"###,
        )
        .arg(
            Arg::new("infile")
                .required(true)
                .index(1)
                .help("Job list (JSON lines) from `splicewig jobs`"),
        )
        .arg(
            Arg::new("artifacts")
                .long("artifacts")
                .num_args(1)
                .default_value(".")
                .help("Directory holding the job artifacts"),
        )
        .arg(
            Arg::new("strand")
                .long("strand")
                .num_args(1)
                .default_value("both")
                .value_parser(["both", "+", "-", "plus", "minus"])
                .help("Strand(s) to aggregate"),
        )
        .arg(
            Arg::new("prefix")
                .long("prefix")
                .num_args(1)
                .default_value("splice")
                .help("Prefix of the track files"),
        )
        .arg(
            Arg::new("outdir")
                .long("outdir")
                .short('o')
                .num_args(1)
                .default_value(".")
                .help("Output location"),
        )
}

/// Builds the tracks of `strands`; returns the strands that failed.
pub fn aggregate_strands(
    jobs: &[JobDescriptor],
    strands: &[Strand],
    artifact_dir: &Path,
    outdir: &Path,
    prefix: &str,
) -> anyhow::Result<Vec<Strand>> {
    std::fs::create_dir_all(outdir)?;

    let records: Vec<SeqRecord> = planned_sizes(jobs)
        .into_iter()
        .map(|(name, len)| SeqRecord { name, len })
        .collect();
    let mut writer = splicewig::writer(&outdir.join("chrom.sizes").to_string_lossy())?;
    splicewig::libs::io::write_sizes(&mut writer, &records)?;
    writer.flush()?;

    let mut failed = vec![];
    for strand in strands {
        match aggregate_strand(jobs, *strand, artifact_dir, outdir, prefix) {
            Ok(summary) => log::info!(
                "Strand {}: {} sequences, {} blocks, {} positions",
                strand,
                summary.sequences,
                summary.blocks,
                summary.positions
            ),
            Err(e) => {
                log::error!("Strand {}: {}", strand, e);
                failed.push(*strand);
            }
        }
    }

    Ok(failed)
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    //----------------------------
    // Args
    //----------------------------
    let infile = args.get_one::<String>("infile").unwrap();
    let artifacts = args.get_one::<String>("artifacts").unwrap();
    let prefix = args.get_one::<String>("prefix").unwrap();
    let outdir = args.get_one::<String>("outdir").unwrap();
    let strands: Vec<Strand> = match args.get_one::<String>("strand").unwrap().as_str() {
        "both" => Strand::BOTH.to_vec(),
        s => vec![s.parse()?],
    };

    //----------------------------
    // Operating
    //----------------------------
    let jobs = read_jobs(splicewig::reader(infile)?)?;
    let failed = aggregate_strands(
        &jobs,
        &strands,
        Path::new(artifacts),
        Path::new(outdir),
        prefix,
    )?;

    if !failed.is_empty() {
        return Err(anyhow::anyhow!(
            "Aggregation failed for strand(s): {}",
            failed
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ));
    }

    Ok(())
}
