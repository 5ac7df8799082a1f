//! Verification prompt definitions
//!
//! Each prompt declares the shape its answer must parse into. The catalog of
//! concrete prompts lives in the service layer.

/// Canonical phrase set declared by a classification prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vocabulary {
    /// Visual appearance phrases that map onto process phases; literal phase
    /// names override the phrase match.
    PhaseAppearance,
    /// Clear vs cloudy liquid.
    LiquidClarity,
    /// Photograph vs computer generated.
    ImageOrigin,
    /// None / few / some / many.
    ParticleCount,
}

/// Expected shape of an answer to a verification prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerKind {
    YesNo,
    /// Integer score inside an inclusive range.
    BoundedScore { min: u32, max: u32 },
    Classification(Vocabulary),
    FreeText,
}

impl AnswerKind {
    /// Short label stored alongside each recorded answer.
    pub fn label(&self) -> &'static str {
        match self {
            AnswerKind::YesNo => "yes_no",
            AnswerKind::BoundedScore { .. } => "score",
            AnswerKind::Classification(_) => "classification",
            AnswerKind::FreeText => "description",
        }
    }
}

/// A single verification question with its declared answer shape.
#[derive(Debug, Clone)]
pub struct VerificationPrompt {
    pub id: &'static str,
    /// Question text with `{expected_phase}`, `{caption}` and
    /// `{growth_percentage}` placeholders.
    pub template: &'static str,
    pub kind: AnswerKind,
    pub phase_specific: bool,
}

/// Values substituted into prompt templates for one corpus record.
#[derive(Debug, Clone, Default)]
pub struct PromptContext<'a> {
    pub expected_phase: &'a str,
    pub caption: &'a str,
    pub growth_percentage: Option<u32>,
}

impl VerificationPrompt {
    /// Render the question text for one corpus record.
    pub fn render(&self, context: &PromptContext<'_>) -> String {
        let phase = if context.expected_phase.is_empty() {
            "unknown"
        } else {
            context.expected_phase
        };
        let growth = context
            .growth_percentage
            .map(|pct| pct.to_string())
            .unwrap_or_else(|| "unknown".to_string());

        self.template
            .replace("{expected_phase}", phase)
            .replace("{caption}", context.caption)
            .replace("{growth_percentage}", &growth)
    }
}
