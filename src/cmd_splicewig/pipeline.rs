use clap::*;
use rayon::prelude::*;
use splicewig::libs::job::{generate, write_jobs, JobDescriptor};
use splicewig::libs::plan::plan;
use splicewig::libs::provider::{open_provider, SequenceProvider};
use splicewig::libs::scorer::CommandScorer;
use splicewig::libs::stitch::Strand;
use splicewig::libs::worker::execute_job;
use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    let cmd = Command::new("pipeline")
        .about("Pipeline - chunk, score and stitch a whole genome on this machine")
        .after_help(
            r###"
This command runs every stage locally, with a thread pool in place of a
cluster scheduler:

1. Read sequence sizes from the reference
2. Plan work units and generate jobs          => <outdir>/jobs.jsonl
3. Run all jobs in parallel                   => <outdir>/artifacts/
4. Wait for all of them, then aggregate       => <outdir>/<prefix>.<strand>.<event>.wig
                                                 <outdir>/chrom.sizes

* The scorer gets one FASTA record on stdin and must print one
  `acceptor<TAB>donor` line per base
* A failed job fails the tracks of its strand only; the other strand is
  still aggregated, and the command exits non-zero
* The default --outdir is `PL-splicewig`, not `.`

Examples:
1. Default chunking, 8 threads:
   splicewig pipeline genome.2bit --scorer "spliceai-window" --parallel 8

2. Small genome, small chunks:
   splicewig pipeline genome.fa --scorer ./score.sh --chunk 100000 --overlap 5000

"###,
        )
        .arg(
            Arg::new("reference")
                .required(true)
                .index(1)
                .help("Reference genome (.2bit or FASTA)"),
        )
        .arg(
            Arg::new("scorer")
                .long("scorer")
                .required(true)
                .num_args(1)
                .help("Scorer command"),
        )
        .arg(
            Arg::new("parallel")
                .long("parallel")
                .short('p')
                .num_args(1)
                .default_value("1")
                .value_parser(value_parser!(usize))
                .help("Number of jobs running at once"),
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
                .short('o')
                .long("outdir")
                .num_args(1)
                .default_value("PL-splicewig")
                .help("Output location"),
        );
    super::add_stitch_args(super::add_plan_args(cmd))
}

// Runs every job; returns the strands with at least one failed job.
fn run_all(
    jobs: &[JobDescriptor],
    provider: &dyn SequenceProvider,
    scorer: &CommandScorer,
    artifact_dir: &Path,
    parallel: usize,
) -> anyhow::Result<BTreeSet<Strand>> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(parallel)
        .build()?;

    let results: Vec<anyhow::Result<PathBuf>> = pool.install(|| {
        jobs.par_iter()
            .map(|job| execute_job(job, provider, scorer, artifact_dir))
            .collect()
    });

    let mut failed = BTreeSet::new();
    for (job, result) in jobs.iter().zip(results) {
        if let Err(e) = result {
            log::error!("Job {} failed: {:#}", job.label(), e);
            failed.insert(job.strand);
        }
    }

    Ok(failed)
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    //----------------------------
    // Args
    //----------------------------
    let reference = args.get_one::<String>("reference").unwrap();
    let scorer = CommandScorer::new(args.get_one::<String>("scorer").unwrap())?;
    let parallel = *args.get_one::<usize>("parallel").unwrap();
    let prefix = args.get_one::<String>("prefix").unwrap();
    let opt = super::plan_options(args);
    let params = super::stitch_params(args);

    let outdir = PathBuf::from(args.get_one::<String>("outdir").unwrap());
    let artifact_dir = outdir.join("artifacts");
    std::fs::create_dir_all(&artifact_dir)?;

    //----------------------------
    // Plan
    //----------------------------
    log::info!("==> Plan");
    let provider = open_provider(reference)?;
    let records = provider.records()?;
    let units = plan(&records, &opt)?;
    let jobs = generate(&units, reference, &params);
    log::info!(
        "{} sequences => {} units => {} jobs",
        records.len(),
        units.len(),
        jobs.len()
    );

    let mut writer = splicewig::writer(&outdir.join("jobs.jsonl").to_string_lossy())?;
    write_jobs(&mut writer, &jobs)?;
    writer.flush()?;

    //----------------------------
    // Score
    //----------------------------
    log::info!("==> Score with {} thread(s)", parallel);
    let failed_jobs = run_all(&jobs, provider.as_ref(), &scorer, &artifact_dir, parallel)?;

    //----------------------------
    // Aggregate
    //----------------------------
    log::info!("==> Aggregate");
    let mut strands = vec![];
    let mut failed = vec![];
    for strand in Strand::BOTH {
        if failed_jobs.contains(&strand) {
            log::error!("Strand {}: skipped, some jobs failed", strand);
            failed.push(strand);
        } else {
            strands.push(strand);
        }
    }
    failed.extend(super::aggregate::aggregate_strands(
        &jobs,
        &strands,
        &artifact_dir,
        &outdir,
        prefix,
    )?);

    if !failed.is_empty() {
        failed.sort();
        return Err(anyhow::anyhow!(
            "Pipeline failed for strand(s): {}",
            failed
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ));
    }

    Ok(())
}
