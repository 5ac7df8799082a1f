//! Sidecar inference endpoint client
//!
//! The model runs as a co-located process that owns the GPU; only the image
//! path and the rendered question cross the boundary.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{AnswerError, AnswerModel};
use crate::model::config::AnswererConfig;

#[derive(Serialize)]
struct AnswerRequest<'a> {
    image_path: &'a str,
    question: &'a str,
}

#[derive(Deserialize)]
struct AnswerResponse {
    answer: String,
}

/// Client for a sidecar inference process exposing a single answer endpoint.
pub struct HttpAnswerer {
    client: Client,
    endpoint: String,
}

impl HttpAnswerer {
    pub fn new(config: &AnswererConfig) -> Self {
        let mut builder = Client::builder().user_agent("crystal-verify/0.1");
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Self {
            client: builder.build().unwrap_or_else(|_| Client::new()),
            endpoint: config.endpoint.clone(),
        }
    }
}

#[async_trait]
impl AnswerModel for HttpAnswerer {
    async fn answer(&self, image: &Path, question: &str) -> Result<String, AnswerError> {
        let image_path = image.to_string_lossy();
        let request = AnswerRequest {
            image_path: &image_path,
            question,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?
            .error_for_status()?;

        let payload: AnswerResponse = response
            .json()
            .await
            .map_err(|e| AnswerError::Payload(e.to_string()))?;

        Ok(payload.answer)
    }
}
