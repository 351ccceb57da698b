extern crate clap;
use clap::*;
use log::{info, Level};

mod cmd_splicewig;

fn main() -> anyhow::Result<()> {
    let start = std::time::Instant::now();
    simple_logger::init_with_level(Level::Info)?;

    let app = Command::new("splicewig")
        .version(crate_version!())
        .author(crate_authors!())
        .about("`splicewig` - Genome-wide splice site tracks from windowed scores")
        .propagate_version(true)
        .arg_required_else_help(true)
        .color(ColorChoice::Auto)
        .subcommand(cmd_splicewig::size::make_subcommand())
        .subcommand(cmd_splicewig::plan::make_subcommand())
        .subcommand(cmd_splicewig::jobs::make_subcommand())
        .subcommand(cmd_splicewig::score::make_subcommand())
        .subcommand(cmd_splicewig::stitch::make_subcommand())
        .subcommand(cmd_splicewig::aggregate::make_subcommand())
        .subcommand(cmd_splicewig::pipeline::make_subcommand())
        .after_help(
            r###"Subcommand groups:

* Planning:
    * size - Sequence names and lengths of a reference
    * plan - Work units: overlapping chunks and batches
    * jobs - One job per unit and strand, JSON lines

* Workers:
    * score  - Run one job: fetch, score, stitch
    * stitch - Trim pre-computed scores of one window

* Results:
    * aggregate - Concatenate artifacts into wiggle tracks

* Pipelines:
    * pipeline - All of the above on this machine

"###,
        );

    // Check which subcomamnd the user ran...
    match app.get_matches().subcommand() {
        Some(("size", sub_matches)) => cmd_splicewig::size::execute(sub_matches),
        Some(("plan", sub_matches)) => cmd_splicewig::plan::execute(sub_matches),
        Some(("jobs", sub_matches)) => cmd_splicewig::jobs::execute(sub_matches),
        Some(("score", sub_matches)) => cmd_splicewig::score::execute(sub_matches),
        Some(("stitch", sub_matches)) => cmd_splicewig::stitch::execute(sub_matches),
        Some(("aggregate", sub_matches)) => cmd_splicewig::aggregate::execute(sub_matches),
        Some(("pipeline", sub_matches)) => cmd_splicewig::pipeline::execute(sub_matches),
        _ => unreachable!(),
    }?;

    info!("Elapsed time: {:?}", start.elapsed());

    Ok(())
}
