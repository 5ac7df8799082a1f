//! Corpus, answer, and result records

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::summary::VerificationSummary;

/// One corpus entry produced by the captioning stage.
///
/// Only the fields the verification pipeline consumes are modelled; unknown
/// corpus fields are ignored on load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptionRecord {
    /// Image file name; the processing identity of the record.
    pub image: String,
    #[serde(default)]
    pub image_path: Option<String>,
    /// Material key, used to reconstruct stale image paths.
    #[serde(default)]
    pub category_id: String,
    /// Expected phase label.
    #[serde(default)]
    pub phase: String,
    #[serde(default)]
    pub initial_caption: String,
    #[serde(default)]
    pub crystal_growth: Option<CrystalGrowth>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrystalGrowth {
    #[serde(default)]
    pub estimated_percentage: Option<u32>,
}

impl CaptionRecord {
    /// Estimated growth percentage, when the captioning stage recorded one.
    pub fn growth_percentage(&self) -> Option<u32> {
        self.crystal_growth
            .as_ref()
            .and_then(|growth| growth.estimated_percentage)
    }
}

/// Whether the collaborator call for one prompt completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallStatus {
    Success,
    Error,
}

/// Whether a successful call's text parsed into its declared answer kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Valid,
    Invalid,
}

/// Typed value extracted from a raw answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NormalizedValue {
    Bool(bool),
    Score(u32),
    Text(String),
}

impl NormalizedValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            NormalizedValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_score(&self) -> Option<u32> {
        match self {
            NormalizedValue::Score(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            NormalizedValue::Text(value) => Some(value),
            _ => None,
        }
    }
}

/// Raw collaborator output for one (image, prompt) pair. Immutable once
/// recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawAnswer {
    /// The rendered question that was asked.
    pub prompt: String,
    pub response: Option<String>,
    /// Answer-kind label of the prompt, for readers of the raw artifact.
    pub response_type: String,
    pub status: CallStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A raw answer plus its validation verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatedAnswer {
    #[serde(flatten)]
    pub raw: RawAnswer,
    pub validation_status: ValidationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalized_value: Option<NormalizedValue>,
}

/// Per-record validation tallies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationStats {
    pub valid_responses: usize,
    pub invalid_responses: usize,
    /// Percentage of answers that validated, one decimal.
    pub validation_rate: f64,
}

/// Completed verification of one image. Final once persisted, unless
/// explicitly reprocessed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageVerificationRecord {
    pub image_path: String,
    pub image_name: String,
    pub expected_phase: String,
    pub expected_caption: String,
    pub verification_results: BTreeMap<String, ValidatedAnswer>,
    pub verification_summary: VerificationSummary,
    pub validation_stats: ValidationStats,
    pub timestamp: DateTime<Utc>,
}

/// Resume marker persisted alongside the result set.
///
/// Invariant: `processed_images` only ever names images whose records are
/// already present in the persisted result set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusCheckpoint {
    pub processed_images: Vec<String>,
    /// Corpus index of the most recently processed image; informational.
    pub last_index: usize,
    pub timestamp: DateTime<Utc>,
    pub total_processed: usize,
}
