//! Answering-model boundary
//!
//! The image-answering model is an external collaborator that holds exclusive
//! hardware state; the pipeline issues one question at a time and treats the
//! returned text as arbitrary, possibly empty.

use std::path::Path;

use async_trait::async_trait;

mod http;

pub use http::HttpAnswerer;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum AnswerError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Malformed answer payload: {0}")]
    Payload(String),
}

/// One question against one image.
#[async_trait]
pub trait AnswerModel: Send + Sync {
    async fn answer(&self, image: &Path, question: &str) -> Result<String, AnswerError>;
}
