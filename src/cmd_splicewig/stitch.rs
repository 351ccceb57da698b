use clap::*;
use splicewig::libs::plan::{BatchUnit, RangeUnit, SeqRecord, WorkUnit};
use splicewig::libs::scorer::parse_scores;
use splicewig::libs::stitch::{stitch, Strand};

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    let cmd = Command::new("stitch")
        .about("Trim pre-computed scores of one window to its output interval")
        .after_help(
            r###"
This command applies the stitching rules to scores computed elsewhere.

Input:
* One `acceptor<TAB>donor` line per fetched base, in the order the bases were
  given to the scorer (reverse-complemented order for -)

Modes:
* --fetch and --output given: a chunk of a longer sequence
* neither given: the whole sequence, 1-<len>

Positions:
* +: donor at p comes from base p-1, acceptor at p from base p+1
* -: acceptor at p comes from base p-1, donor at p from base p+1
* Missing neighbours at the sequence ends are written as 0

Examples:
1. Interior chunk on the plus strand:
   splicewig stitch scores.tsv --chrom chr1 --len 20000000 \
       --fetch 5950001-12050000 --output 6000001-12000000

2. A whole short sequence on the minus strand:
   splicewig stitch scores.tsv --chrom chrM --len 16569 --strand -

"###,
        )
        .arg(
            Arg::new("infile")
                .required(true)
                .index(1)
                .help("Scores, `acceptor<TAB>donor` per base. [stdin] for screen"),
        )
        .arg(
            Arg::new("chrom")
                .long("chrom")
                .required(true)
                .num_args(1)
                .help("Sequence name"),
        )
        .arg(
            Arg::new("len")
                .long("len")
                .required(true)
                .num_args(1)
                .value_parser(value_parser!(usize))
                .help("Sequence length"),
        )
        .arg(
            Arg::new("fetch")
                .long("fetch")
                .num_args(1)
                .requires("output")
                .help("Scored interval, start-end"),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .num_args(1)
                .requires("fetch")
                .help("Interval to keep, start-end"),
        )
        .arg(
            Arg::new("strand")
                .long("strand")
                .num_args(1)
                .default_value("+")
                .value_parser(["+", "-", "plus", "minus"])
                .help("Strand the scores were computed on"),
        )
        .arg(
            Arg::new("outfile")
                .long("outfile")
                .short('o')
                .num_args(1)
                .default_value("stdout")
                .help("Output filename. [stdout] for screen"),
        );
    super::add_stitch_args(cmd)
}

fn parse_interval(s: &str) -> anyhow::Result<(usize, usize)> {
    let (start, end) = s
        .split_once('-')
        .ok_or_else(|| anyhow::anyhow!("Invalid interval [{}], expected start-end", s))?;
    Ok((start.trim().parse()?, end.trim().parse()?))
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    //----------------------------
    // Args
    //----------------------------
    let infile = args.get_one::<String>("infile").unwrap();
    let chrom = args.get_one::<String>("chrom").unwrap();
    let len = *args.get_one::<usize>("len").unwrap();
    let strand: Strand = args.get_one::<String>("strand").unwrap().parse()?;
    let params = super::stitch_params(args);

    let unit = match (args.get_one::<String>("fetch"), args.get_one::<String>("output")) {
        (Some(fetch), Some(output)) => {
            let (fetch_start, fetch_end) = parse_interval(fetch)?;
            let (output_start, output_end) = parse_interval(output)?;
            WorkUnit::Range(RangeUnit {
                name: chrom.to_string(),
                seq_len: len,
                fetch_start,
                fetch_end,
                output_start,
                output_end,
            })
        }
        _ => WorkUnit::Batch(BatchUnit {
            members: vec![SeqRecord::new(chrom, len)],
        }),
    };

    //----------------------------
    // Operating
    //----------------------------
    let scored = parse_scores(splicewig::reader(infile)?)?;
    let stream = stitch(&[scored], &unit, strand, &params)?;

    //----------------------------
    // Output
    //----------------------------
    let mut writer = splicewig::writer(args.get_one::<String>("outfile").unwrap())?;
    stream.write_to(&mut writer)?;

    Ok(())
}
