//! Result-set and checkpoint persistence
//!
//! Results are written before the checkpoint, so the checkpoint's processed
//! set only ever names images whose records are already on disk. Each file
//! lands via a temp-file rename; readers never observe a partial write.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;

use super::RunnerError;
use crate::model::record::{CorpusCheckpoint, ImageVerificationRecord};
use crate::model::stats::CorpusStatistics;

pub const RESULTS_FILE: &str = "verification_results.json";
pub const CHECKPOINT_FILE: &str = "verification_checkpoint.json";
pub const STATISTICS_FILE: &str = "verification_statistics.json";
pub const NEEDS_REVIEW_FILE: &str = "needs_review.json";
const BACKUP_DIR: &str = "backups";

/// Prior progress recovered from a checkpoint.
#[derive(Debug, Default)]
pub struct ResumeState {
    pub results: Vec<ImageVerificationRecord>,
    pub processed: HashSet<String>,
    pub last_index: usize,
}

/// Owns the artifact paths for one output location. A single store instance
/// owns the location for the duration of a run.
pub struct CheckpointStore {
    output_dir: PathBuf,
}

impl CheckpointStore {
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self, RunnerError> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir)?;
        Ok(Self { output_dir })
    }

    pub fn results_path(&self) -> PathBuf {
        self.output_dir.join(RESULTS_FILE)
    }

    pub fn checkpoint_path(&self) -> PathBuf {
        self.output_dir.join(CHECKPOINT_FILE)
    }

    pub fn statistics_path(&self) -> PathBuf {
        self.output_dir.join(STATISTICS_FILE)
    }

    pub fn needs_review_path(&self) -> PathBuf {
        self.output_dir.join(NEEDS_REVIEW_FILE)
    }

    /// Whether a resumable run is pending at this location.
    pub fn has_checkpoint(&self) -> bool {
        self.checkpoint_path().exists()
    }

    /// Load a prior run's results and processed set, if a checkpoint exists.
    /// A corrupt checkpoint is logged and treated as absent.
    pub fn load_resume_state(&self) -> Option<ResumeState> {
        if !self.has_checkpoint() {
            return None;
        }

        let load = || -> Result<ResumeState, RunnerError> {
            let checkpoint: CorpusCheckpoint =
                serde_json::from_str(&fs::read_to_string(self.checkpoint_path())?)?;
            let results = if self.results_path().exists() {
                self.load_results()?
            } else {
                Vec::new()
            };

            Ok(ResumeState {
                results,
                processed: checkpoint.processed_images.into_iter().collect(),
                last_index: checkpoint.last_index,
            })
        };

        match load() {
            Ok(state) => Some(state),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load checkpoint, starting fresh");
                None
            }
        }
    }

    /// Load the persisted result set.
    pub fn load_results(&self) -> Result<Vec<ImageVerificationRecord>, RunnerError> {
        let path = self.results_path();
        if !path.exists() {
            return Err(RunnerError::ResultsMissing(path.display().to_string()));
        }
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }

    /// Persist the full result set and a checkpoint reflecting exactly the
    /// processed set so far.
    pub fn persist(
        &self,
        results: &[ImageVerificationRecord],
        processed: &HashSet<String>,
        last_index: usize,
    ) -> Result<(), RunnerError> {
        self.write_atomic(&self.results_path(), &results)?;

        let mut processed_images: Vec<String> = processed.iter().cloned().collect();
        processed_images.sort();
        let checkpoint = CorpusCheckpoint {
            total_processed: processed_images.len(),
            processed_images,
            last_index,
            timestamp: Utc::now(),
        };
        self.write_atomic(&self.checkpoint_path(), &checkpoint)
    }

    pub fn write_results(&self, results: &[ImageVerificationRecord]) -> Result<(), RunnerError> {
        self.write_atomic(&self.results_path(), &results)
    }

    pub fn write_statistics(&self, statistics: &CorpusStatistics) -> Result<(), RunnerError> {
        self.write_atomic(&self.statistics_path(), statistics)
    }

    pub fn write_needs_review(
        &self,
        review: &[ImageVerificationRecord],
    ) -> Result<(), RunnerError> {
        self.write_atomic(&self.needs_review_path(), &review)
    }

    /// Remove the checkpoint; its absence marks a clean completion.
    pub fn clear_checkpoint(&self) -> Result<(), RunnerError> {
        let path = self.checkpoint_path();
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    /// Copy the current result set into a timestamped backup before a
    /// destructive rewrite.
    pub fn backup_results(
        &self,
        results: &[ImageVerificationRecord],
    ) -> Result<PathBuf, RunnerError> {
        let backup_dir = self.output_dir.join(BACKUP_DIR);
        fs::create_dir_all(&backup_dir)?;

        let stamp = Utc::now().format("%Y%m%d_%H%M%S");
        let path = backup_dir.join(format!("verification_results_backup_{stamp}.json"));
        self.write_atomic(&path, &results)?;
        tracing::info!(path = %path.display(), "Result set backed up");
        Ok(path)
    }

    fn write_atomic<T: Serialize>(&self, path: &Path, value: &T) -> Result<(), RunnerError> {
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(value)?)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}
