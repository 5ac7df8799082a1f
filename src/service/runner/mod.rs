//! Batch verification runner
//!
//! Drives the caption corpus through the prompt battery. Processing is
//! strictly sequential: the answering model holds exclusive hardware state,
//! so at most one call is in flight at a time. Progress is checkpointed so an
//! interrupted run resumes without reprocessing completed images.

mod checkpoint;
mod error;
mod state;

pub use checkpoint::{CheckpointStore, ResumeState};
pub use error::RunnerError;
pub use state::{InvalidTransition, RunEvent, RunState};

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use rand::seq::SliceRandom;

use crate::answerer::AnswerModel;
use crate::model::config::Config;
use crate::model::prompt::PromptContext;
use crate::model::record::{
    CallStatus, CaptionRecord, ImageVerificationRecord, RawAnswer, ValidatedAnswer,
    ValidationStatus,
};
use crate::model::stats::CorpusStatistics;
use crate::service::{catalog, corpus, stats, summarize, validation};

/// How a run ended. A paused run is not an error.
#[derive(Debug)]
pub enum RunOutcome {
    /// Every image processed; final artifacts written, checkpoint cleared.
    Completed(CorpusStatistics),
    /// Interrupted cooperatively; progress persisted for resume.
    Paused { processed: usize, remaining: usize },
    /// The run located no images at all.
    Empty,
}

/// Options for one invocation.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Verify a random sample instead of the full corpus. Fresh starts only;
    /// a resumed run keeps the original corpus selection.
    pub sample_size: Option<usize>,
    /// Resume from an existing checkpoint when present.
    pub resume: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            sample_size: None,
            resume: true,
        }
    }
}

pub struct BatchRunner {
    answerer: Arc<dyn AnswerModel>,
    store: CheckpointStore,
    config: Config,
    options: RunOptions,
    cancel: Arc<AtomicBool>,
    state: RunState,
}

impl BatchRunner {
    pub fn new(
        answerer: Arc<dyn AnswerModel>,
        config: Config,
        options: RunOptions,
        cancel: Arc<AtomicBool>,
    ) -> Result<Self, RunnerError> {
        let store = CheckpointStore::new(&config.output_dir)?;
        Ok(Self {
            answerer,
            store,
            config,
            options,
            cancel,
            state: RunState::Idle,
        })
    }

    fn step(&mut self, event: RunEvent) -> Result<(), RunnerError> {
        self.state = self.state.transition(event)?;
        tracing::debug!(state = ?self.state, "Run state changed");
        Ok(())
    }

    /// Run the batch to completion, pause, or empty result.
    pub async fn run(&mut self) -> Result<RunOutcome, RunnerError> {
        self.step(RunEvent::Load)?;

        let corpus_records = corpus::load_corpus(&self.config.captions_file)?;

        let ResumeState {
            mut results,
            mut processed,
            mut last_index,
        } = if self.options.resume {
            self.store.load_resume_state().unwrap_or_default()
        } else {
            ResumeState::default()
        };

        if !processed.is_empty() {
            tracing::info!(
                processed = processed.len(),
                last_index,
                "Resuming from checkpoint"
            );
        }

        let selected = select_records(corpus_records, self.options.sample_size, processed.is_empty());
        let remaining: Vec<(usize, &CaptionRecord)> = selected
            .iter()
            .enumerate()
            .filter(|(_, record)| !processed.contains(&record.image))
            .collect();

        tracing::info!(
            total = selected.len(),
            remaining = remaining.len(),
            "Starting verification"
        );

        self.step(RunEvent::Start)?;

        let total_remaining = remaining.len();
        let mut run_processed = 0usize;
        let mut missing_images = 0usize;

        for (corpus_index, record) in remaining {
            // Cancellation is cooperative: checked between images, never
            // mid-call.
            if self.cancel.load(Ordering::Relaxed) {
                self.step(RunEvent::Interrupt)?;
                self.store.persist(&results, &processed, last_index)?;
                tracing::info!(
                    processed = processed.len(),
                    remaining = total_remaining - run_processed,
                    "Run paused, progress saved"
                );
                return Ok(RunOutcome::Paused {
                    processed: processed.len(),
                    remaining: total_remaining - run_processed,
                });
            }

            let Some(image_path) = corpus::resolve_image_path(record, &self.config.dataset_root)
            else {
                missing_images += 1;
                tracing::warn!(image = %record.image, "Image file not found, left unprocessed");
                continue;
            };

            let verified = self.verify_image(&image_path, record).await;
            results.push(verified);
            processed.insert(record.image.clone());
            last_index = corpus_index;
            run_processed += 1;

            if run_processed % self.config.checkpoint_interval == 0 {
                self.step(RunEvent::Checkpoint)?;
                self.store.persist(&results, &processed, last_index)?;
                tracing::debug!(processed = processed.len(), "Checkpoint saved");
                self.step(RunEvent::Resume)?;
            }
        }

        self.step(RunEvent::Finish)?;

        if results.is_empty() {
            tracing::warn!(missing = missing_images, "No images could be located");
            return Ok(RunOutcome::Empty);
        }

        let statistics = stats::compute_statistics(&results);
        let review = stats::needs_review(&results);
        self.store.write_results(&results)?;
        self.store.write_statistics(&statistics)?;
        self.store.write_needs_review(&review)?;
        self.store.clear_checkpoint()?;

        tracing::info!(
            total = statistics.total_processed,
            needs_review = statistics.needs_review_count,
            missing = missing_images,
            "Verification complete"
        );
        Ok(RunOutcome::Completed(statistics))
    }

    /// Ask every catalog prompt against one image and fold the answers into a
    /// completed record. A per-prompt call failure is recorded on that prompt
    /// only and does not abort the image's other prompts.
    async fn verify_image(
        &self,
        image_path: &Path,
        record: &CaptionRecord,
    ) -> ImageVerificationRecord {
        let context = PromptContext {
            expected_phase: &record.phase,
            caption: &record.initial_caption,
            growth_percentage: record.growth_percentage(),
        };

        let mut answers = BTreeMap::new();
        for prompt in catalog::prompts() {
            let question = prompt.render(&context);

            let raw = match self.answerer.answer(image_path, &question).await {
                Ok(text) => RawAnswer {
                    prompt: question,
                    response: Some(text),
                    response_type: prompt.kind.label().to_string(),
                    status: CallStatus::Success,
                    error: None,
                },
                Err(e) => {
                    tracing::warn!(
                        image = %record.image,
                        prompt = prompt.id,
                        error = %e,
                        "Answer call failed"
                    );
                    RawAnswer {
                        prompt: question,
                        response: None,
                        response_type: prompt.kind.label().to_string(),
                        status: CallStatus::Error,
                        error: Some(e.to_string()),
                    }
                }
            };

            let (validation_status, normalized_value) = match raw.status {
                CallStatus::Success => {
                    let (valid, value) =
                        validation::validate(raw.response.as_deref(), prompt.kind, prompt.id);
                    if valid {
                        (ValidationStatus::Valid, value)
                    } else {
                        (ValidationStatus::Invalid, None)
                    }
                }
                CallStatus::Error => (ValidationStatus::Invalid, None),
            };

            answers.insert(
                prompt.id.to_string(),
                ValidatedAnswer {
                    raw,
                    validation_status,
                    normalized_value,
                },
            );
        }

        let verification_summary = summarize::summarize(&answers, &record.phase);
        let validation_stats = summarize::validation_stats(&answers);

        ImageVerificationRecord {
            image_path: image_path.display().to_string(),
            image_name: record.image.clone(),
            expected_phase: record.phase.clone(),
            expected_caption: record.initial_caption.clone(),
            verification_results: answers,
            verification_summary,
            validation_stats,
            timestamp: Utc::now(),
        }
    }
}

/// Draw a random sample on fresh starts; resumed runs keep the original
/// corpus selection.
fn select_records(
    records: Vec<CaptionRecord>,
    sample_size: Option<usize>,
    fresh: bool,
) -> Vec<CaptionRecord> {
    match sample_size {
        Some(size) if fresh && size < records.len() => {
            let mut rng = rand::thread_rng();
            let sampled: Vec<CaptionRecord> =
                records.choose_multiple(&mut rng, size).cloned().collect();
            tracing::info!(sample = size, corpus = records.len(), "Sampled corpus");
            sampled
        }
        _ => records,
    }
}
