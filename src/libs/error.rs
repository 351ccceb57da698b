use thiserror::Error;

/// Failure classes of the chunk/score/stitch pipeline.
///
/// * `Planning` aborts before any job exists.
/// * `Fetch` and `Stitch` are fatal for one job only, but block aggregation
///   of that job's strand.
/// * `Aggregation` is fatal for the track being built.
#[derive(Error, Debug)]
pub enum Error {
    #[error("planning error: {0}")]
    Planning(String),

    #[error("fetch error: {0}")]
    Fetch(String),

    #[error("stitch error: {0}")]
    Stitch(String),

    #[error("aggregation error: {0}")]
    Aggregation(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
