//! Error taxonomy for batch verification runs
//!
//! Only run-terminating failures surface here: a missing corpus at startup
//! and unrecoverable persistence failures. Per-image and per-prompt failures
//! are captured inline in records and never abort the batch.

use thiserror::Error;

use super::state::InvalidTransition;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RunnerError {
    #[error("Captions file not found: {0}")]
    CorpusMissing(String),

    #[error("Result set not found: {0}")]
    ResultsMissing(String),

    #[error("I/O failure on corpus or artifacts: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed JSON artifact: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    State(#[from] InvalidTransition),
}
