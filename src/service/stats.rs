//! Aggregate statistics over the persisted result set
//!
//! Derived artifacts only; always recomputable from the records and never
//! authoritative state.

use std::collections::BTreeMap;

use chrono::Utc;

use crate::model::record::{ImageVerificationRecord, ValidationStatus};
use crate::model::stats::{
    ConfidenceDistribution, CorpusStatistics, PhaseBreakdown, ValidationSummary,
};
use crate::model::summary::ConfidenceLevel;

/// Compute corpus statistics over the full result set.
pub fn compute_statistics(results: &[ImageVerificationRecord]) -> CorpusStatistics {
    let mut by_phase: BTreeMap<String, PhaseBreakdown> = BTreeMap::new();
    let mut distribution = ConfidenceDistribution::default();
    let mut invalid_response_types: BTreeMap<String, usize> = BTreeMap::new();

    let mut phase_match_count = 0usize;
    let mut caption_accurate_count = 0usize;
    let mut needs_review_count = 0usize;
    let mut total_valid = 0usize;
    let mut total_invalid = 0usize;

    for record in results {
        let summary = &record.verification_summary;
        let phase = if record.expected_phase.is_empty() {
            "unknown"
        } else {
            record.expected_phase.as_str()
        };
        let breakdown = by_phase.entry(phase.to_string()).or_default();
        breakdown.total += 1;

        if summary.phase_match == Some(true) {
            phase_match_count += 1;
            breakdown.phase_match += 1;
        }
        if summary.caption_accurate == Some(true) {
            caption_accurate_count += 1;
            breakdown.caption_accurate += 1;
        }
        if summary.needs_review {
            needs_review_count += 1;
            breakdown.needs_review += 1;
        }

        match summary.confidence_level {
            ConfidenceLevel::High => distribution.high += 1,
            ConfidenceLevel::Medium => distribution.medium += 1,
            ConfidenceLevel::Low => distribution.low += 1,
        }

        total_valid += record.validation_stats.valid_responses;
        total_invalid += record.validation_stats.invalid_responses;

        for (prompt_id, answer) in &record.verification_results {
            if answer.validation_status == ValidationStatus::Invalid {
                let key = format!("{}_{}", prompt_id, answer.raw.response_type);
                *invalid_response_types.entry(key).or_insert(0) += 1;
            }
        }
    }

    let total = results.len();
    let total_responses = total_valid + total_invalid;

    CorpusStatistics {
        total_processed: total,
        by_phase,
        phase_match_rate: rate(phase_match_count, total),
        caption_accuracy_rate: rate(caption_accurate_count, total),
        needs_review_count,
        confidence_distribution: distribution,
        validation_summary: ValidationSummary {
            total_valid_responses: total_valid,
            total_invalid_responses: total_invalid,
            avg_validation_rate: if total_responses > 0 {
                round1(total_valid as f64 / total_responses as f64 * 100.0)
            } else {
                0.0
            },
        },
        invalid_response_types,
        generated_at: Utc::now(),
    }
}

/// Records flagged for human review.
pub fn needs_review(results: &[ImageVerificationRecord]) -> Vec<ImageVerificationRecord> {
    results
        .iter()
        .filter(|record| record.verification_summary.needs_review)
        .cloned()
        .collect()
}

fn rate(count: usize, total: usize) -> f64 {
    if total > 0 {
        round4(count as f64 / total as f64)
    } else {
        0.0
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::model::record::{CallStatus, NormalizedValue, RawAnswer, ValidatedAnswer};
    use crate::service::summarize;

    fn record(name: &str, phase: &str, phase_match: bool) -> ImageVerificationRecord {
        let mut answers = BTreeMap::new();
        answers.insert(
            "phase_correct".to_string(),
            ValidatedAnswer {
                raw: RawAnswer {
                    prompt: String::new(),
                    response: Some(if phase_match { "yes" } else { "no" }.to_string()),
                    response_type: "yes_no".to_string(),
                    status: CallStatus::Success,
                    error: None,
                },
                validation_status: crate::model::record::ValidationStatus::Valid,
                normalized_value: Some(NormalizedValue::Bool(phase_match)),
            },
        );
        answers.insert(
            "visual_characteristics".to_string(),
            ValidatedAnswer {
                raw: RawAnswer {
                    prompt: String::new(),
                    response: Some("???".to_string()),
                    response_type: "description".to_string(),
                    status: CallStatus::Success,
                    error: None,
                },
                validation_status: crate::model::record::ValidationStatus::Invalid,
                normalized_value: None,
            },
        );

        let verification_summary = summarize::summarize(&answers, phase);
        let validation_stats = summarize::validation_stats(&answers);
        ImageVerificationRecord {
            image_path: format!("/data/{name}"),
            image_name: name.to_string(),
            expected_phase: phase.to_string(),
            expected_caption: String::new(),
            verification_results: answers,
            verification_summary,
            validation_stats,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn statistics_tally_by_phase_and_confidence() {
        let results = vec![
            record("a.png", "labile", true),
            record("b.png", "labile", false),
            record("c.png", "metastable", true),
        ];

        let stats = compute_statistics(&results);

        assert_eq!(stats.total_processed, 3);
        assert_eq!(stats.by_phase["labile"].total, 2);
        assert_eq!(stats.by_phase["labile"].phase_match, 1);
        assert_eq!(stats.by_phase["metastable"].total, 1);
        assert_eq!(stats.phase_match_rate, round4(2.0 / 3.0));
        assert_eq!(
            stats.confidence_distribution.high
                + stats.confidence_distribution.medium
                + stats.confidence_distribution.low,
            3
        );
        assert_eq!(
            stats.invalid_response_types["visual_characteristics_description"],
            3
        );
        assert_eq!(stats.validation_summary.total_valid_responses, 3);
        assert_eq!(stats.validation_summary.total_invalid_responses, 3);
        assert_eq!(stats.validation_summary.avg_validation_rate, 50.0);
    }

    #[test]
    fn needs_review_filters_flagged_records() {
        let results = vec![
            record("a.png", "labile", true),
            record("b.png", "labile", false),
        ];
        let review = needs_review(&results);
        // Only the phase-mismatch record scores Low.
        assert_eq!(review.len(), 1);
        assert_eq!(review[0].image_name, "b.png");
    }

    #[test]
    fn empty_result_set_yields_zero_rates() {
        let stats = compute_statistics(&[]);
        assert_eq!(stats.total_processed, 0);
        assert_eq!(stats.phase_match_rate, 0.0);
        assert_eq!(stats.validation_summary.avg_validation_rate, 0.0);
        assert!(stats.by_phase.is_empty());
    }
}
