pub mod error;
pub mod io;
pub mod job;
pub mod plan;
pub mod provider;
pub mod scorer;
pub mod stitch;
pub mod track;
pub mod twobit;
pub mod worker;
