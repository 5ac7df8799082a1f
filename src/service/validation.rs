//! Response validation for verification answers
//!
//! Normalizes the answering model's free text into the declared answer kind.
//! Fails closed: absent or empty input is always invalid. Deterministic with
//! no side effects, so validation can be re-run over stored raw answers and
//! reach the same verdicts.

use std::sync::OnceLock;

use regex::{Regex, RegexSet};

use crate::model::phase::Phase;
use crate::model::prompt::{AnswerKind, Vocabulary};
use crate::model::record::NormalizedValue;

/// Appearance phrases accepted by the phase classification, longest first so
/// compound phrases win over their fragments.
const PHASE_APPEARANCE_PHRASES: [&str; 8] = [
    "clear liquid",
    "cloudy liquid",
    "small particles",
    "large crystals",
    "clear",
    "cloudy",
    "particles",
    "crystals",
];

const PARTICLE_COUNTS: [&str; 4] = ["none", "few", "some", "many"];

fn integer_tokens() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(\d+)\b").unwrap())
}

fn single_digit() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(\d)\b").unwrap())
}

fn non_answer_patterns() -> &'static RegexSet {
    static RE: OnceLock<RegexSet> = OnceLock::new();
    RE.get_or_init(|| {
        RegexSet::new([
            r"^i (don't|have no) (know|idea)",
            r"^if you can't",
            r"^what do you",
            r"^i can't",
            r"^\?+$",
        ])
        .unwrap()
    })
}

/// Validate one raw answer against its declared kind.
///
/// Returns whether the answer parsed, and the normalized value when it did.
pub fn validate(
    response: Option<&str>,
    kind: AnswerKind,
    prompt_id: &str,
) -> (bool, Option<NormalizedValue>) {
    let Some(raw) = response else {
        return (false, None);
    };

    let text = raw.trim().to_lowercase();
    if text.is_empty() {
        return (false, None);
    }

    let verdict = match kind {
        AnswerKind::YesNo => validate_yes_no(&text),
        AnswerKind::BoundedScore { min, max } => validate_score(&text, min, max),
        AnswerKind::Classification(vocabulary) => validate_classification(&text, vocabulary),
        AnswerKind::FreeText => validate_free_text(&text),
    };

    if !verdict.0 {
        tracing::debug!(prompt = prompt_id, response = %text, "Rejected answer");
    }

    verdict
}

/// "yes" is checked before "no", so a response containing both resolves to
/// yes.
fn validate_yes_no(text: &str) -> (bool, Option<NormalizedValue>) {
    if text.contains("yes") {
        (true, Some(NormalizedValue::Bool(true)))
    } else if text.contains("no") {
        (true, Some(NormalizedValue::Bool(false)))
    } else {
        (false, None)
    }
}

/// The first word-delimited integer token inside the declared range wins.
/// The 1-5 prompts get a relaxed second pass over single digits.
fn validate_score(text: &str, min: u32, max: u32) -> (bool, Option<NormalizedValue>) {
    for capture in integer_tokens().captures_iter(text) {
        if let Ok(value) = capture[1].parse::<u32>() {
            if value >= min && value <= max {
                return (true, Some(NormalizedValue::Score(value)));
            }
        }
    }

    if (min, max) == (1, 5) {
        if let Some(capture) = single_digit().captures(text) {
            if let Ok(value) = capture[1].parse::<u32>() {
                if value >= min && value <= max {
                    return (true, Some(NormalizedValue::Score(value)));
                }
            }
        }
    }

    (false, None)
}

fn validate_classification(text: &str, vocabulary: Vocabulary) -> (bool, Option<NormalizedValue>) {
    let matched = match vocabulary {
        Vocabulary::PhaseAppearance => {
            // A literal phase name overrides the appearance phrases.
            Phase::ORDERED
                .iter()
                .map(|phase| phase.as_str())
                .find(|name| text.contains(*name))
                .or_else(|| {
                    PHASE_APPEARANCE_PHRASES
                        .iter()
                        .copied()
                        .find(|phrase| text.contains(phrase))
                })
        }
        Vocabulary::LiquidClarity => {
            if text.contains("clear") {
                Some("clear")
            } else if text.contains("cloudy") {
                Some("cloudy")
            } else {
                None
            }
        }
        Vocabulary::ImageOrigin => {
            if text.contains("photo") {
                Some("photo")
            } else if text.contains("generated")
                || text.contains("computer")
                || text.contains("simulated")
            {
                Some("generated")
            } else {
                None
            }
        }
        Vocabulary::ParticleCount => PARTICLE_COUNTS
            .iter()
            .copied()
            .find(|count| text.contains(count))
            .or_else(|| {
                let zero =
                    text.contains('0') || text.contains("no ") || text.contains("not visible");
                zero.then_some("none")
            }),
    };

    match matched {
        Some(value) => (true, Some(NormalizedValue::Text(value.to_string()))),
        None => (false, None),
    }
}

/// Free text is accepted unless it is one of the known non-answers.
fn validate_free_text(text: &str) -> (bool, Option<NormalizedValue>) {
    if non_answer_patterns().is_match(text) {
        (false, None)
    } else {
        (true, Some(NormalizedValue::Text(text.to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLARITY: AnswerKind = AnswerKind::BoundedScore { min: 1, max: 5 };
    const OVERALL: AnswerKind = AnswerKind::BoundedScore { min: 1, max: 10 };
    const DENSITY: AnswerKind = AnswerKind::BoundedScore { min: 0, max: 100 };

    #[test]
    fn absent_or_empty_is_always_invalid() {
        for kind in [
            AnswerKind::YesNo,
            CLARITY,
            AnswerKind::Classification(Vocabulary::ParticleCount),
            AnswerKind::FreeText,
        ] {
            assert_eq!(validate(None, kind, "t"), (false, None));
            assert_eq!(validate(Some(""), kind, "t"), (false, None));
            assert_eq!(validate(Some("   "), kind, "t"), (false, None));
        }
    }

    #[test]
    fn yes_wins_over_no() {
        assert_eq!(
            validate(Some("yes, but no crystals"), AnswerKind::YesNo, "phase_correct"),
            (true, Some(NormalizedValue::Bool(true)))
        );
        assert_eq!(
            validate(Some("No."), AnswerKind::YesNo, "phase_correct"),
            (true, Some(NormalizedValue::Bool(false)))
        );
        assert_eq!(
            validate(Some("maybe"), AnswerKind::YesNo, "phase_correct"),
            (false, None)
        );
    }

    #[test]
    fn score_takes_first_in_range_token() {
        assert_eq!(
            validate(Some("3 out of 5"), CLARITY, "crystal_clarity"),
            (true, Some(NormalizedValue::Score(3)))
        );
        assert_eq!(
            validate(Some("maybe"), CLARITY, "crystal_clarity"),
            (false, None)
        );
        // Out-of-range tokens are skipped, not taken.
        assert_eq!(
            validate(Some("12 then 4"), CLARITY, "crystal_clarity"),
            (true, Some(NormalizedValue::Score(4)))
        );
        assert_eq!(
            validate(Some("0 or 7"), CLARITY, "crystal_clarity"),
            (false, None)
        );
    }

    #[test]
    fn ten_point_and_percentage_ranges() {
        assert_eq!(
            validate(Some("10"), OVERALL, "overall_verification"),
            (true, Some(NormalizedValue::Score(10)))
        );
        assert_eq!(
            validate(Some("I'd say 15, maybe 8"), OVERALL, "overall_verification"),
            (true, Some(NormalizedValue::Score(8)))
        );
        assert_eq!(
            validate(Some("around 40 percent"), DENSITY, "growth_estimation"),
            (true, Some(NormalizedValue::Score(40)))
        );
        assert_eq!(
            validate(Some("500"), DENSITY, "growth_estimation"),
            (false, None)
        );
    }

    #[test]
    fn phase_name_overrides_appearance_phrase() {
        let kind = AnswerKind::Classification(Vocabulary::PhaseAppearance);
        assert_eq!(
            validate(
                Some("I see clear liquid but this is actually labile"),
                kind,
                "phase_classification"
            ),
            (true, Some(NormalizedValue::Text("labile".to_string())))
        );
        assert_eq!(
            validate(Some("Cloudy liquid"), kind, "phase_classification"),
            (true, Some(NormalizedValue::Text("cloudy liquid".to_string())))
        );
        assert_eq!(
            validate(Some("a blue square"), kind, "phase_classification"),
            (false, None)
        );
    }

    #[test]
    fn liquid_clarity_prefers_clear() {
        let kind = AnswerKind::Classification(Vocabulary::LiquidClarity);
        assert_eq!(
            validate(Some("the liquid looks clear"), kind, "growth_to_next_stage"),
            (true, Some(NormalizedValue::Text("clear".to_string())))
        );
        assert_eq!(
            validate(Some("somewhat cloudy"), kind, "growth_to_next_stage"),
            (true, Some(NormalizedValue::Text("cloudy".to_string())))
        );
        assert_eq!(
            validate(Some("murky"), kind, "growth_to_next_stage"),
            (false, None)
        );
    }

    #[test]
    fn image_origin_vocabulary() {
        let kind = AnswerKind::Classification(Vocabulary::ImageOrigin);
        assert_eq!(
            validate(Some("a photograph"), kind, "material_type"),
            (true, Some(NormalizedValue::Text("photo".to_string())))
        );
        assert_eq!(
            validate(Some("computer rendering"), kind, "material_type"),
            (true, Some(NormalizedValue::Text("generated".to_string())))
        );
        assert_eq!(
            validate(Some("a painting"), kind, "material_type"),
            (false, None)
        );
    }

    #[test]
    fn particle_count_maps_zero_forms_to_none() {
        let kind = AnswerKind::Classification(Vocabulary::ParticleCount);
        assert_eq!(
            validate(Some("a few crystals"), kind, "crystal_count"),
            (true, Some(NormalizedValue::Text("few".to_string())))
        );
        assert_eq!(
            validate(Some("0"), kind, "crystal_count"),
            (true, Some(NormalizedValue::Text("none".to_string())))
        );
        assert_eq!(
            validate(Some("not visible"), kind, "crystal_count"),
            (true, Some(NormalizedValue::Text("none".to_string())))
        );
        assert_eq!(validate(Some("lots"), kind, "crystal_count"), (false, None));
    }

    #[test]
    fn free_text_rejects_known_non_answers() {
        for garbage in [
            "I don't know",
            "i have no idea what that is",
            "what do you mean",
            "if you can't see it, say so",
            "I can't tell",
            "???",
        ] {
            assert_eq!(
                validate(Some(garbage), AnswerKind::FreeText, "visual_characteristics"),
                (false, None),
                "expected rejection for {garbage:?}"
            );
        }

        assert_eq!(
            validate(
                Some("  A beaker of cloudy solution with crystals forming.  "),
                AnswerKind::FreeText,
                "visual_characteristics"
            ),
            (
                true,
                Some(NormalizedValue::Text(
                    "a beaker of cloudy solution with crystals forming.".to_string()
                ))
            )
        );
    }

    #[test]
    fn same_input_same_verdict() {
        let first = validate(Some("4 out of 5"), CLARITY, "crystal_clarity");
        let second = validate(Some("4 out of 5"), CLARITY, "crystal_clarity");
        assert_eq!(first, second);
    }
}
