//! Aggregate corpus statistics
//!
//! Derived artifacts only; always recomputable from the full result set and
//! never authoritative state.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-phase verification tallies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseBreakdown {
    pub total: usize,
    pub phase_match: usize,
    pub caption_accurate: usize,
    pub needs_review: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfidenceDistribution {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub total_valid_responses: usize,
    pub total_invalid_responses: usize,
    /// Percentage of all answers that validated, one decimal.
    pub avg_validation_rate: f64,
}

/// Aggregate view of a verification run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusStatistics {
    pub total_processed: usize,
    pub by_phase: BTreeMap<String, PhaseBreakdown>,
    pub phase_match_rate: f64,
    pub caption_accuracy_rate: f64,
    pub needs_review_count: usize,
    pub confidence_distribution: ConfidenceDistribution,
    pub validation_summary: ValidationSummary,
    /// Invalid-answer counts keyed by `{prompt_id}_{kind}`.
    pub invalid_response_types: BTreeMap<String, usize>,
    pub generated_at: DateTime<Utc>,
}
