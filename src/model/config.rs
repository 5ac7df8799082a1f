use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

const ENV_CONFIG_PATH: &str = "CRYSTAL_VERIFY_CONFIG_PATH";
const ENV_CAPTIONS_FILE: &str = "CRYSTAL_VERIFY_CAPTIONS";
const ENV_OUTPUT_DIR: &str = "CRYSTAL_VERIFY_OUTPUT_DIR";
const ENV_DATASET_ROOT: &str = "CRYSTAL_VERIFY_DATASET_ROOT";
const ENV_ANSWERER_ENDPOINT: &str = "CRYSTAL_VERIFY_ENDPOINT";
const ENV_ANSWERER_TIMEOUT: &str = "CRYSTAL_VERIFY_TIMEOUT_SECS";

const DEFAULT_CONFIG_PATH: &str = "config.yaml";
const DEFAULT_CAPTIONS_FILE: &str = "all_captions.json";
const DEFAULT_OUTPUT_DIR: &str = "verification_results";
const DEFAULT_DATASET_ROOT: &str = "dataset";
const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8650/answer";
const DEFAULT_CHECKPOINT_INTERVAL: usize = 10;

/// Answering-collaborator connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct AnswererConfig {
    /// Sidecar inference endpoint.
    pub endpoint: String,
    /// Optional per-call deadline. The model call has no intrinsic timeout;
    /// this is imposed at the boundary only.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl Default for AnswererConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_timeout_secs: None,
        }
    }
}

/// YAML configuration file structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub captions_file: Option<PathBuf>,
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    #[serde(default)]
    pub dataset_root: Option<PathBuf>,
    #[serde(default)]
    pub answerer: Option<AnswererConfig>,
    #[serde(default)]
    pub checkpoint_interval: Option<usize>,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub captions_file: PathBuf,
    pub output_dir: PathBuf,
    /// Root of the image dataset, used to reconstruct stale image paths.
    pub dataset_root: PathBuf,
    pub answerer: AnswererConfig,
    /// Results and checkpoint are persisted together every this many
    /// processed images.
    pub checkpoint_interval: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            captions_file: PathBuf::from(DEFAULT_CAPTIONS_FILE),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            dataset_root: PathBuf::from(DEFAULT_DATASET_ROOT),
            answerer: AnswererConfig::default(),
            checkpoint_interval: DEFAULT_CHECKPOINT_INTERVAL,
        }
    }
}

impl Config {
    /// Load configuration: defaults, overlaid by the config file, overlaid by
    /// environment variables.
    pub fn from_env() -> Self {
        let config_path =
            std::env::var(ENV_CONFIG_PATH).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        let file = Self::load_config_file(&config_path).unwrap_or_default();
        let mut config = Config::default();

        if let Some(path) = file.captions_file {
            config.captions_file = path;
        }
        if let Some(path) = file.output_dir {
            config.output_dir = path;
        }
        if let Some(path) = file.dataset_root {
            config.dataset_root = path;
        }
        if let Some(answerer) = file.answerer {
            config.answerer = answerer;
        }
        if let Some(interval) = file.checkpoint_interval {
            config.checkpoint_interval = interval.max(1);
        }

        if let Ok(path) = std::env::var(ENV_CAPTIONS_FILE) {
            config.captions_file = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var(ENV_OUTPUT_DIR) {
            config.output_dir = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var(ENV_DATASET_ROOT) {
            config.dataset_root = PathBuf::from(path);
        }
        if let Ok(endpoint) = std::env::var(ENV_ANSWERER_ENDPOINT) {
            config.answerer.endpoint = endpoint;
        }
        if let Ok(secs) = std::env::var(ENV_ANSWERER_TIMEOUT) {
            config.answerer.request_timeout_secs = secs.parse().ok();
        }

        config
    }

    /// Load configuration from a YAML file; missing or unparseable files
    /// degrade to defaults.
    fn load_config_file(path: &str) -> Option<ConfigFile> {
        let path = Path::new(path);

        if !path.exists() {
            tracing::debug!(path = %path.display(), "Config file not found, using defaults");
            return None;
        }

        match fs::read_to_string(path) {
            Ok(contents) => {
                let contents = contents.trim();
                if contents.is_empty() {
                    tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
                    return Some(ConfigFile::default());
                }

                match serde_yaml::from_str(contents) {
                    Ok(config) => {
                        tracing::info!(path = %path.display(), "Loaded configuration from file");
                        Some(config)
                    }
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "Failed to parse config file, using defaults");
                        None
                    }
                }
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read config file, using defaults");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = Config::default();
        assert_eq!(config.checkpoint_interval, 10);
        assert_eq!(config.output_dir, PathBuf::from("verification_results"));
        assert!(config.answerer.request_timeout_secs.is_none());
    }

    #[test]
    fn config_file_sections_are_optional() {
        let file: ConfigFile = serde_yaml::from_str(
            r#"
output_dir: /tmp/verify-out
answerer:
  endpoint: http://10.0.0.5:9000/answer
  request_timeout_secs: 120
"#,
        )
        .unwrap();

        assert_eq!(file.output_dir, Some(PathBuf::from("/tmp/verify-out")));
        assert!(file.captions_file.is_none());
        let answerer = file.answerer.unwrap();
        assert_eq!(answerer.endpoint, "http://10.0.0.5:9000/answer");
        assert_eq!(answerer.request_timeout_secs, Some(120));
    }
}
