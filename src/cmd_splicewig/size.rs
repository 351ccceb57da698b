use clap::*;
use splicewig::libs::provider::{open_provider, SequenceProvider};

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("size")
        .about("Get sequence sizes from a .2bit or FASTA reference")
        .after_help(
            r###"
This command writes one `name<TAB>length` line per sequence, in the order of
the reference. The output is the size index consumed by `splicewig plan`.

Notes:
* Files ending in .2bit are read with random access
* Anything else is read as FASTA, .gz is supported

Examples:
1. Get sizes from a 2bit file:
   splicewig size genome.2bit

2. Save the output to a file:
   splicewig size genome.fa.gz -o chrom.sizes

"###,
        )
        .arg(
            Arg::new("infile")
                .required(true)
                .index(1)
                .help("Reference genome (.2bit or FASTA)"),
        )
        .arg(
            Arg::new("outfile")
                .long("outfile")
                .short('o')
                .num_args(1)
                .default_value("stdout")
                .help("Output filename. [stdout] for screen"),
        )
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    let infile = args.get_one::<String>("infile").unwrap();
    let mut writer = splicewig::writer(args.get_one::<String>("outfile").unwrap())?;

    let provider = open_provider(infile)?;
    let records = provider.records()?;
    splicewig::libs::io::write_sizes(&mut writer, &records)?;

    Ok(())
}
