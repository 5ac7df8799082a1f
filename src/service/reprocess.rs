//! Re-validation and re-scoring of persisted results
//!
//! Summaries are pure functions of the stored raw answers, so a result set
//! can be re-scored in place at any time, e.g. after a validator rule change.
//! The checkpoint of a paused run is left untouched.

use crate::model::record::{CallStatus, ImageVerificationRecord, ValidationStatus};
use crate::model::stats::CorpusStatistics;
use crate::service::runner::{CheckpointStore, RunnerError};
use crate::service::{catalog, stats, summarize, validation};

/// Re-validate every stored raw answer and recompute every summary plus the
/// derived artifacts. The prior result set is backed up first.
pub fn reprocess_results(store: &CheckpointStore) -> Result<CorpusStatistics, RunnerError> {
    let mut results = store.load_results()?;
    store.backup_results(&results)?;

    tracing::info!(count = results.len(), "Re-scoring persisted results");
    for record in &mut results {
        rescore_record(record);
    }

    let statistics = stats::compute_statistics(&results);
    let review = stats::needs_review(&results);
    store.write_results(&results)?;
    store.write_statistics(&statistics)?;
    store.write_needs_review(&review)?;

    tracing::info!(
        total = statistics.total_processed,
        needs_review = statistics.needs_review_count,
        "Reprocessing complete"
    );
    Ok(statistics)
}

/// Re-run validation and summarization for one record against the current
/// catalog. Prompt ids the catalog no longer declares are left untouched.
pub fn rescore_record(record: &mut ImageVerificationRecord) {
    for (prompt_id, answer) in record.verification_results.iter_mut() {
        let Some(prompt) = catalog::get(prompt_id) else {
            continue;
        };

        match answer.raw.status {
            CallStatus::Success => {
                let (valid, value) =
                    validation::validate(answer.raw.response.as_deref(), prompt.kind, prompt.id);
                answer.validation_status = if valid {
                    ValidationStatus::Valid
                } else {
                    ValidationStatus::Invalid
                };
                answer.normalized_value = value;
            }
            CallStatus::Error => {
                answer.validation_status = ValidationStatus::Invalid;
                answer.normalized_value = None;
            }
        }
    }

    record.verification_summary =
        summarize::summarize(&record.verification_results, &record.expected_phase);
    record.validation_stats = summarize::validation_stats(&record.verification_results);
}
