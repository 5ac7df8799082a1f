//! Per-image verification summary

use serde::{Deserialize, Serialize};

use crate::model::phase::Phase;

/// Outcome of the weighted confidence scoring; Low implies flagged for
/// human review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

/// Derived view of one image's validated answers.
///
/// A pure function of the stored raw answers and the expected phase, so it can
/// be recomputed from persisted data at any time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationSummary {
    pub total_prompts: usize,
    /// Prompts whose collaborator call completed.
    pub successful_prompts: usize,
    /// Successful prompts whose answer also parsed into its declared kind.
    pub valid_responses: usize,

    pub phase_match: Option<bool>,
    pub caption_accurate: Option<bool>,
    pub particles_visible: Option<bool>,
    pub crystal_clarity_score: Option<u32>,
    pub overall_score: Option<u32>,
    pub growth_percentage: Option<u32>,
    pub predicted_phase: Option<Phase>,
    pub particle_count: Option<String>,
    pub particle_count_normalized: Option<String>,
    pub liquid_clarity: Option<String>,

    pub confidence_points: u32,
    pub confidence_max: u32,
    /// points / max x 100, one decimal; 0 when max is 0.
    pub confidence_pct: f64,
    pub confidence_level: ConfidenceLevel,
    pub needs_review: bool,
}
