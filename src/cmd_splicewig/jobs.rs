use clap::*;
use splicewig::libs::job::{command_line, generate, write_jobs};
use splicewig::libs::plan::plan;
use splicewig::libs::provider::{open_provider, SequenceProvider};
use std::io::Write;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    let cmd = Command::new("jobs")
        .about("Generate the job list for a reference")
        .after_help(
            r###"
This command plans the reference into work units and emits two jobs per unit,
one per strand. All `+` jobs come first, then all `-` jobs, each list in
plan order.

Output:
* One JSON object per line, the input of `splicewig score` and
  `splicewig aggregate`
* With --commands, also one worker command line per job, ready to hand to a
  cluster scheduler

Notes:
* Sizes are read from the reference unless --sizes is given
* The reference path is stored in every job as given; use an absolute path
  when jobs run elsewhere
* --commands needs --outfile to be a file

Examples:
1. JSON jobs:
   splicewig jobs genome.2bit -o jobs.jsonl

2. Also a command list for the scheduler:
   splicewig jobs genome.2bit -o jobs.jsonl --commands jobs.sh \
       --scorer "spliceai-window --model 1" --outdir results

"###,
        )
        .arg(
            Arg::new("reference")
                .required(true)
                .index(1)
                .help("Reference genome (.2bit or FASTA)"),
        )
        .arg(
            Arg::new("sizes")
                .long("sizes")
                .num_args(1)
                .help("Size index to plan from instead of the reference"),
        )
        .arg(
            Arg::new("commands")
                .long("commands")
                .num_args(1)
                .help("Also write one worker command line per job to this file"),
        )
        .arg(
            Arg::new("scorer")
                .long("scorer")
                .num_args(1)
                .default_value("splice-scorer")
                .help("Scorer command written into --commands"),
        )
        .arg(
            Arg::new("outdir")
                .long("outdir")
                .num_args(1)
                .default_value("results")
                .help("Artifact directory written into --commands"),
        )
        .arg(
            Arg::new("outfile")
                .long("outfile")
                .short('o')
                .num_args(1)
                .default_value("stdout")
                .help("Output filename. [stdout] for screen"),
        );
    super::add_stitch_args(super::add_plan_args(cmd))
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    //----------------------------
    // Args
    //----------------------------
    let reference = args.get_one::<String>("reference").unwrap();
    let outfile = args.get_one::<String>("outfile").unwrap();
    let opt = super::plan_options(args);
    let params = super::stitch_params(args);

    if args.contains_id("commands") && outfile == "stdout" {
        return Err(anyhow::anyhow!("Cannot use --commands with stdout output"));
    }

    //----------------------------
    // Operating
    //----------------------------
    let records = if let Some(sizes) = args.get_one::<String>("sizes") {
        splicewig::libs::io::read_sizes(sizes)?
    } else {
        open_provider(reference)?.records()?
    };
    let units = plan(&records, &opt)?;
    let jobs = generate(&units, reference, &params);
    log::info!(
        "{} sequences => {} units => {} jobs",
        records.len(),
        units.len(),
        jobs.len()
    );

    //----------------------------
    // Output
    //----------------------------
    let mut writer = splicewig::writer(outfile)?;
    write_jobs(&mut writer, &jobs)?;
    writer.flush()?;

    if let Some(commands) = args.get_one::<String>("commands") {
        let exe = std::env::current_exe()?.display().to_string();
        let scorer = args.get_one::<String>("scorer").unwrap();
        let outdir = args.get_one::<String>("outdir").unwrap();

        let mut cmd_writer = splicewig::writer(commands)?;
        for job in &jobs {
            writeln!(
                cmd_writer,
                "{}",
                command_line(job, &exe, outfile, scorer, outdir)
            )?;
        }
    }

    Ok(())
}
