pub mod catalog;
pub mod corpus;
pub mod reprocess;
pub mod runner;
pub mod stats;
pub mod summarize;
pub mod validation;

pub use runner::{BatchRunner, CheckpointStore, RunOptions, RunOutcome, RunnerError};
