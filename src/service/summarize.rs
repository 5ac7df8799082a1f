//! Verification summary derivation
//!
//! Folds one image's validated answers into a confidence-scored summary.
//! Pure over its inputs, so a summary can be recomputed from stored raw data
//! and resumption never changes already-scored records.

use std::collections::BTreeMap;

use crate::model::phase::Phase;
use crate::model::record::{CallStatus, ValidatedAnswer, ValidationStats, ValidationStatus};
use crate::model::summary::{ConfidenceLevel, VerificationSummary};

/// Derive the summary for one image.
///
/// Only answers whose call completed count toward `successful_prompts`; only
/// those that additionally validated contribute to scoring fields.
pub fn summarize(
    answers: &BTreeMap<String, ValidatedAnswer>,
    expected_phase: &str,
) -> VerificationSummary {
    let mut summary = VerificationSummary {
        total_prompts: answers.len(),
        successful_prompts: 0,
        valid_responses: 0,
        phase_match: None,
        caption_accurate: None,
        particles_visible: None,
        crystal_clarity_score: None,
        overall_score: None,
        growth_percentage: None,
        predicted_phase: None,
        particle_count: None,
        particle_count_normalized: None,
        liquid_clarity: None,
        confidence_points: 0,
        confidence_max: 0,
        confidence_pct: 0.0,
        confidence_level: ConfidenceLevel::Low,
        needs_review: true,
    };

    for (prompt_id, answer) in answers {
        if answer.raw.status != CallStatus::Success {
            continue;
        }
        summary.successful_prompts += 1;

        if answer.validation_status != ValidationStatus::Valid {
            continue;
        }
        summary.valid_responses += 1;

        let Some(value) = &answer.normalized_value else {
            continue;
        };

        match prompt_id.as_str() {
            "phase_correct" => summary.phase_match = value.as_bool(),
            "caption_accurate" => summary.caption_accurate = value.as_bool(),
            "info_correct" => summary.particles_visible = value.as_bool(),
            "crystal_clarity" => summary.crystal_clarity_score = value.as_score(),
            "overall_verification" => summary.overall_score = value.as_score(),
            "growth_estimation" => summary.growth_percentage = value.as_score(),
            "phase_classification" => {
                summary.predicted_phase = value.as_text().and_then(predicted_phase);
            }
            "growth_to_next_stage" => {
                summary.liquid_clarity = value.as_text().map(str::to_string);
            }
            "crystal_count" => {
                summary.particle_count = answer
                    .raw
                    .response
                    .as_ref()
                    .map(|response| response.trim().to_lowercase());
                summary.particle_count_normalized = value.as_text().map(str::to_string);
            }
            _ => {}
        }
    }

    let valid_ratio = if summary.successful_prompts > 0 {
        summary.valid_responses as f64 / summary.successful_prompts as f64
    } else {
        0.0
    };

    let (points, max) = confidence_points(&summary, expected_phase, valid_ratio);
    summary.confidence_points = points;
    summary.confidence_max = max;
    summary.confidence_pct = if max > 0 {
        round1(points as f64 / max as f64 * 100.0)
    } else {
        0.0
    };

    // Both the percentage and the valid-response ratio must clear their bar.
    let (level, needs_review) = if summary.confidence_pct >= 60.0 && valid_ratio >= 0.6 {
        (ConfidenceLevel::High, false)
    } else if summary.confidence_pct >= 40.0 && valid_ratio >= 0.5 {
        (ConfidenceLevel::Medium, false)
    } else {
        (ConfidenceLevel::Low, true)
    };
    summary.confidence_level = level;
    summary.needs_review = needs_review;

    summary
}

/// Validation tallies over every prompt of a record, call failures included.
pub fn validation_stats(answers: &BTreeMap<String, ValidatedAnswer>) -> ValidationStats {
    let valid = answers
        .values()
        .filter(|answer| answer.validation_status == ValidationStatus::Valid)
        .count();
    let invalid = answers.len() - valid;
    let total = valid + invalid;

    ValidationStats {
        valid_responses: valid,
        invalid_responses: invalid,
        validation_rate: if total > 0 {
            round1(valid as f64 / total as f64 * 100.0)
        } else {
            0.0
        },
    }
}

/// Fixed-weight point system. Max points accumulate only for criteria that
/// were attempted; the ratio criterion always applies.
fn confidence_points(
    summary: &VerificationSummary,
    expected_phase: &str,
    valid_ratio: f64,
) -> (u32, u32) {
    let mut points = 0;
    let mut max = 0;

    // 1. Direct phase question answered.
    if let Some(matched) = summary.phase_match {
        max += 2;
        if matched {
            points += 2;
        }
    }

    // 2. Predicted phase agrees with the corpus label.
    if let Some(predicted) = summary.predicted_phase {
        max += 2;
        if Phase::parse(expected_phase) == Some(predicted) {
            points += 2;
        }
    }

    // 3. Overall quality score, graded.
    if let Some(score) = summary.overall_score {
        max += 3;
        points += if score >= 5 {
            3
        } else if score >= 3 {
            2
        } else {
            1
        };
    }

    // 4. Particle clarity score, graded.
    if let Some(score) = summary.crystal_clarity_score {
        max += 2;
        if score >= 3 {
            points += 2;
        } else if score >= 2 {
            points += 1;
        }
    }

    // 5. Particle count category resolved.
    if let Some(count) = &summary.particle_count_normalized {
        if count != "unknown" {
            max += 1;
            points += 1;
        }
    }

    // 6. Valid-response ratio bonus; always applicable.
    max += 1;
    if valid_ratio >= 0.7 {
        points += 1;
    }

    (points, max)
}

/// Phrase-to-phase mapping for the appearance classification. Literal phase
/// names pass straight through.
fn predicted_phase(label: &str) -> Option<Phase> {
    if let Some(phase) = Phase::parse(label) {
        return Some(phase);
    }

    match label {
        "clear liquid" | "clear" => Some(Phase::Unsaturated),
        "cloudy liquid" | "cloudy" => Some(Phase::Labile),
        "small particles" | "particles" => Some(Phase::Intermediate),
        "large crystals" | "crystals" => Some(Phase::Metastable),
        _ => None,
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
