use clap::*;
use splicewig::libs::plan::{plan, WorkUnit};
use std::io::Write;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    let cmd = Command::new("plan")
        .about("Split sequences into work units")
        .after_help(
            r###"
This command reads a size index (`name<TAB>length`) and prints the work units.

Output columns:
    id  kind  name  fetch  output

* range units: one sub-interval of a long sequence
    0   range   chr1    1-6050000       1-6000000
* batch units: short sequences processed whole, comma separated
    5   batch   chrM,chrUn_01   -   -

Notes:
* Coordinates are 1-based, inclusive
* Sequences >= --chunk are split into --chunk sized outputs, each fetched with
  --overlap extra bases on both sides (clamped to the sequence)
* Shorter sequences are packed into batches of at most --max-batch members
  whose cumulative length goes over --chunk only by their last member
* The order is shuffled with --seed; the same input and seed always give the
  same units

Examples:
1. Default chunking:
   splicewig plan chrom.sizes

2. Smaller chunks:
   splicewig plan chrom.sizes --chunk 1000000 --overlap 10000

"###,
        )
        .arg(
            Arg::new("infile")
                .required(true)
                .index(1)
                .help("Size index, `name<TAB>length` per line"),
        )
        .arg(
            Arg::new("outfile")
                .long("outfile")
                .short('o')
                .num_args(1)
                .default_value("stdout")
                .help("Output filename. [stdout] for screen"),
        );
    super::add_plan_args(cmd)
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    //----------------------------
    // Args
    //----------------------------
    let infile = args.get_one::<String>("infile").unwrap();
    let opt = super::plan_options(args);
    let mut writer = splicewig::writer(args.get_one::<String>("outfile").unwrap())?;

    //----------------------------
    // Operating
    //----------------------------
    let records = splicewig::libs::io::read_sizes(infile)?;
    let units = plan(&records, &opt)?;
    log::info!("{} sequences => {} units", records.len(), units.len());

    //----------------------------
    // Output
    //----------------------------
    for (id, unit) in units.iter().enumerate() {
        match unit {
            WorkUnit::Range(r) => writeln!(
                writer,
                "{}\trange\t{}\t{}-{}\t{}-{}",
                id, r.name, r.fetch_start, r.fetch_end, r.output_start, r.output_end
            )?,
            WorkUnit::Batch(b) => {
                let names: Vec<&str> = b.members.iter().map(|m| m.name.as_str()).collect();
                writeln!(writer, "{}\tbatch\t{}\t-\t-", id, names.join(","))?
            }
        }
    }

    Ok(())
}
