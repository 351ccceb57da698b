use clap::*;
use splicewig::libs::job::read_jobs;
use splicewig::libs::provider::open_provider;
use splicewig::libs::scorer::CommandScorer;
use splicewig::libs::stitch::Strand;
use splicewig::libs::worker::execute_job;
use std::path::Path;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("score")
        .about("Run one job: fetch, score, stitch")
        .after_help(
            r###"
This command executes a single job of a job list, the unit of work handed to a
cluster scheduler.

Steps:
1. Fetch the unit's interval(s) from the reference, reverse-complemented for -
2. Pipe each window as a FASTA record into the --scorer command, which must
   print one `acceptor<TAB>donor` line per base
3. Trim the scores to the output interval and write the artifact
   <outdir>/<plus|minus>.<id>.tsv

Notes:
* The artifact appears only when the job succeeded; a failed or killed job
  leaves nothing behind
* Jobs are independent and may run in any order

Examples:
1. The third minus-strand job:
   splicewig score jobs.jsonl --id 2 --strand - --scorer "spliceai-window" --outdir results

"###,
        )
        .arg(
            Arg::new("infile")
                .required(true)
                .index(1)
                .help("Job list (JSON lines) from `splicewig jobs`"),
        )
        .arg(
            Arg::new("id")
                .long("id")
                .required(true)
                .num_args(1)
                .value_parser(value_parser!(usize))
                .help("Job id"),
        )
        .arg(
            Arg::new("strand")
                .long("strand")
                .required(true)
                .num_args(1)
                .value_parser(["+", "-", "plus", "minus"])
                .help("Job strand"),
        )
        .arg(
            Arg::new("scorer")
                .long("scorer")
                .required(true)
                .num_args(1)
                .help("Scorer command"),
        )
        .arg(
            Arg::new("outdir")
                .long("outdir")
                .short('o')
                .num_args(1)
                .default_value(".")
                .help("Artifact directory"),
        )
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    //----------------------------
    // Args
    //----------------------------
    let infile = args.get_one::<String>("infile").unwrap();
    let id = *args.get_one::<usize>("id").unwrap();
    let strand: Strand = args.get_one::<String>("strand").unwrap().parse()?;
    let scorer = CommandScorer::new(args.get_one::<String>("scorer").unwrap())?;
    let outdir = args.get_one::<String>("outdir").unwrap();
    std::fs::create_dir_all(outdir)?;

    //----------------------------
    // Operating
    //----------------------------
    let jobs = read_jobs(splicewig::reader(infile)?)?;
    let job = jobs
        .iter()
        .find(|j| j.id == id && j.strand == strand)
        .ok_or_else(|| anyhow::anyhow!("Job {}{} not found in {}", strand, id, infile))?;

    let provider = open_provider(&job.reference)?;
    let path = execute_job(job, provider.as_ref(), &scorer, Path::new(outdir))?;
    log::info!("Job {} => {}", job.label(), path.display());

    Ok(())
}
