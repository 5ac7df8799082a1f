//! Static catalog of verification prompts
//!
//! The battery asked of the answering model for every image, in ask order.
//! Defined once at process start; never mutated.

use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::model::prompt::{AnswerKind, PromptContext, VerificationPrompt, Vocabulary};
use crate::model::record::CaptionRecord;
use crate::service::runner::RunnerError;

/// The verification battery. Question phrasing targets instruction-tuned
/// vision models that follow a direct Q&A format.
pub const VERIFICATION_PROMPTS: [VerificationPrompt; 13] = [
    VerificationPrompt {
        id: "phase_correct",
        template: "Is this image showing a {expected_phase} state? Answer yes or no.",
        kind: AnswerKind::YesNo,
        phase_specific: true,
    },
    VerificationPrompt {
        id: "caption_accurate",
        template: "Is this a microscopic or scientific image? Answer yes or no.",
        kind: AnswerKind::YesNo,
        phase_specific: false,
    },
    VerificationPrompt {
        id: "info_correct",
        template: "Are there visible particles or crystals in this image? Answer yes or no.",
        kind: AnswerKind::YesNo,
        phase_specific: false,
    },
    VerificationPrompt {
        id: "crystal_clarity",
        template: "How clear are the particles? Answer only 1, 2, 3, 4, or 5.",
        kind: AnswerKind::BoundedScore { min: 1, max: 5 },
        phase_specific: false,
    },
    VerificationPrompt {
        id: "phase_classification",
        template: "Is this image: clear liquid, cloudy liquid, small particles, or large crystals? Answer one.",
        kind: AnswerKind::Classification(Vocabulary::PhaseAppearance),
        phase_specific: false,
    },
    VerificationPrompt {
        id: "visual_characteristics",
        template: "Describe what you see in this image in one sentence.",
        kind: AnswerKind::FreeText,
        phase_specific: false,
    },
    VerificationPrompt {
        id: "growth_estimation",
        template: "What percentage of the image has visible particles? Answer a number 0 to 100.",
        kind: AnswerKind::BoundedScore { min: 0, max: 100 },
        phase_specific: false,
    },
    VerificationPrompt {
        id: "growth_to_next_stage",
        template: "Is the liquid clear or cloudy? Answer clear or cloudy.",
        kind: AnswerKind::Classification(Vocabulary::LiquidClarity),
        phase_specific: false,
    },
    VerificationPrompt {
        id: "image_quality",
        template: "Rate image sharpness. Answer only 1, 2, 3, 4, or 5.",
        kind: AnswerKind::BoundedScore { min: 1, max: 5 },
        phase_specific: false,
    },
    VerificationPrompt {
        id: "caption_completeness",
        template: "What objects or substances are visible in this image?",
        kind: AnswerKind::FreeText,
        phase_specific: false,
    },
    VerificationPrompt {
        id: "material_type",
        template: "Is this a photograph or computer generated? Answer photo or generated.",
        kind: AnswerKind::Classification(Vocabulary::ImageOrigin),
        phase_specific: false,
    },
    VerificationPrompt {
        id: "crystal_count",
        template: "How many particles are visible? Answer none, few, some, or many.",
        kind: AnswerKind::Classification(Vocabulary::ParticleCount),
        phase_specific: false,
    },
    VerificationPrompt {
        id: "overall_verification",
        template: "Rate this image quality from 1 to 10. Answer only the number.",
        kind: AnswerKind::BoundedScore { min: 1, max: 10 },
        phase_specific: false,
    },
];

/// The battery in ask order.
pub fn prompts() -> &'static [VerificationPrompt] {
    &VERIFICATION_PROMPTS
}

/// Look up a prompt by id.
pub fn get(id: &str) -> Option<&'static VerificationPrompt> {
    VERIFICATION_PROMPTS.iter().find(|prompt| prompt.id == id)
}

/// Prompt battery rendered for one corpus record, for offline batch
/// preparation or manual review.
#[derive(Debug, Serialize)]
pub struct PreparedImagePrompts {
    pub image: String,
    pub image_path: Option<String>,
    pub phase: String,
    pub prompts: Vec<PreparedPrompt>,
}

#[derive(Debug, Serialize)]
pub struct PreparedPrompt {
    pub id: &'static str,
    pub prompt: String,
    pub response_type: &'static str,
}

/// Render the full battery for every corpus record without touching the model.
pub fn prepare_prompts(records: &[CaptionRecord]) -> Vec<PreparedImagePrompts> {
    records
        .iter()
        .map(|record| {
            let context = PromptContext {
                expected_phase: &record.phase,
                caption: &record.initial_caption,
                growth_percentage: record.growth_percentage(),
            };

            PreparedImagePrompts {
                image: record.image.clone(),
                image_path: record.image_path.clone(),
                phase: record.phase.clone(),
                prompts: VERIFICATION_PROMPTS
                    .iter()
                    .map(|prompt| PreparedPrompt {
                        id: prompt.id,
                        prompt: prompt.render(&context),
                        response_type: prompt.kind.label(),
                    })
                    .collect(),
            }
        })
        .collect()
}

/// Write the prepared prompt battery for a corpus to `path`.
pub fn export_prompts(records: &[CaptionRecord], path: &Path) -> Result<usize, RunnerError> {
    let prepared = prepare_prompts(records);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_vec_pretty(&prepared)?)?;
    tracing::info!(path = %path.display(), images = prepared.len(), "Prepared prompts written");
    Ok(prepared.len())
}
