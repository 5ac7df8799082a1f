//! Caption corpus loading and image path resolution

use std::fs;
use std::path::{Path, PathBuf};

use crate::model::record::CaptionRecord;
use crate::service::runner::RunnerError;

/// Load the ordered caption corpus. A missing or unreadable corpus is fatal;
/// no partial run is attempted.
pub fn load_corpus(path: &Path) -> Result<Vec<CaptionRecord>, RunnerError> {
    if !path.exists() {
        return Err(RunnerError::CorpusMissing(path.display().to_string()));
    }

    let contents = fs::read_to_string(path)?;
    let records: Vec<CaptionRecord> = serde_json::from_str(&contents)?;

    tracing::info!(path = %path.display(), count = records.len(), "Loaded caption corpus");
    Ok(records)
}

/// Resolve an image on disk, falling back to the dataset layout
/// `<root>/<category>/<phase>/<name>` when the stored path is missing or
/// stale.
pub fn resolve_image_path(record: &CaptionRecord, dataset_root: &Path) -> Option<PathBuf> {
    if let Some(stored) = &record.image_path {
        let path = PathBuf::from(stored);
        if path.exists() {
            return Some(path);
        }
    }

    let rebuilt = dataset_root
        .join(&record.category_id)
        .join(&record.phase)
        .join(&record.image);
    rebuilt.exists().then_some(rebuilt)
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn record(image: &str, image_path: Option<String>) -> CaptionRecord {
        CaptionRecord {
            image: image.to_string(),
            image_path,
            category_id: "sodium_chloride".to_string(),
            phase: "labile".to_string(),
            initial_caption: String::new(),
            crystal_growth: None,
        }
    }

    #[test]
    fn missing_corpus_is_fatal() {
        let err = load_corpus(Path::new("/no/such/captions.json")).unwrap_err();
        assert!(matches!(err, RunnerError::CorpusMissing(_)));
    }

    #[test]
    fn corpus_order_is_preserved() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("captions.json");
        fs::write(
            &path,
            r#"[
                {"image": "b.png", "phase": "labile"},
                {"image": "a.png", "phase": "unsaturated"}
            ]"#,
        )
        .unwrap();

        let records = load_corpus(&path).unwrap();
        let names: Vec<&str> = records.iter().map(|r| r.image.as_str()).collect();
        assert_eq!(names, ["b.png", "a.png"]);
    }

    #[test]
    fn stale_path_falls_back_to_dataset_layout() {
        let dir = TempDir::new().unwrap();
        let image_dir = dir.path().join("sodium_chloride").join("labile");
        fs::create_dir_all(&image_dir).unwrap();
        fs::write(image_dir.join("img_0001.png"), b"png").unwrap();

        let record = record("img_0001.png", Some("/stale/img_0001.png".to_string()));
        let resolved = resolve_image_path(&record, dir.path()).unwrap();
        assert_eq!(resolved, image_dir.join("img_0001.png"));
    }

    #[test]
    fn unresolvable_image_is_none() {
        let dir = TempDir::new().unwrap();
        let record = record("gone.png", None);
        assert!(resolve_image_path(&record, dir.path()).is_none());
    }
}
