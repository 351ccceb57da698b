//! Subcommand modules for the `splicewig` binary.

use clap::*;
use splicewig::libs::plan::PlanOptions;
use splicewig::libs::stitch::StitchParams;

pub mod aggregate;
pub mod jobs;
pub mod pipeline;
pub mod plan;
pub mod score;
pub mod size;
pub mod stitch;

/// Chunking options shared by `plan`, `jobs` and `pipeline`
pub fn add_plan_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("chunk")
            .long("chunk")
            .short('c')
            .num_args(1)
            .default_value("6000000")
            .value_parser(value_parser!(usize))
            .help("Maximum output length of one work unit"),
    )
    .arg(
        Arg::new("overlap")
            .long("overlap")
            .num_args(1)
            .default_value("50000")
            .value_parser(value_parser!(usize))
            .help("Context fetched on each side of a chunk"),
    )
    .arg(
        Arg::new("min_size")
            .long("min-size")
            .num_args(1)
            .default_value("1")
            .value_parser(value_parser!(usize))
            .help("Skip sequences shorter than this"),
    )
    .arg(
        Arg::new("max_batch")
            .long("max-batch")
            .num_args(1)
            .default_value("100")
            .value_parser(value_parser!(usize))
            .help("Maximum number of short sequences in one batch"),
    )
    .arg(
        Arg::new("seed")
            .long("seed")
            .num_args(1)
            .default_value("42")
            .value_parser(value_parser!(u64))
            .help("Random seed for the processing order"),
    )
}

pub fn plan_options(args: &ArgMatches) -> PlanOptions {
    PlanOptions {
        chunk: *args.get_one::<usize>("chunk").unwrap(),
        overlap: *args.get_one::<usize>("overlap").unwrap(),
        min_size: *args.get_one::<usize>("min_size").unwrap(),
        max_batch: *args.get_one::<usize>("max_batch").unwrap(),
        seed: *args.get_one::<u64>("seed").unwrap(),
    }
}

/// Output formatting options shared by `jobs`, `stitch` and `pipeline`
pub fn add_stitch_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("resolution")
            .long("resolution")
            .num_args(1)
            .default_value("3")
            .value_parser(value_parser!(usize))
            .help("Fractional digits of the output values"),
    )
    .arg(
        Arg::new("floor")
            .long("floor")
            .num_args(1)
            .default_value("0.001")
            .value_parser(value_parser!(f64))
            .help("Values below this are written as 0"),
    )
}

pub fn stitch_params(args: &ArgMatches) -> StitchParams {
    StitchParams {
        resolution: *args.get_one::<usize>("resolution").unwrap(),
        floor: *args.get_one::<f64>("floor").unwrap(),
    }
}
