use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::BatchError;
use crate::store::{self, ArchiveStore};

pub const DEFAULT_MAX_WORKERS: usize = 2;
pub const DEFAULT_RETRIES: u32 = 3;
pub const DOWNLOADER_BINARY: &str = "yt-dlp";
pub const OUTPUT_TEMPLATE: &str = "%(uploader)s_%(upload_date)s_%(title)s.%(ext)s";

/// Settings persisted between runs.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_dir: Option<Utf8PathBuf>,
    #[serde(
        default,
        deserialize_with = "lenient_workers",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_workers: Option<i64>,
}

impl Config {
    pub fn workers(&self) -> usize {
        clamp_workers(self.max_workers)
    }
}

// A non-numeric value should not throw away the rest of the file.
fn lenient_workers<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(number)) => number.as_i64(),
        Some(serde_json::Value::String(text)) => text.trim().parse().ok(),
        _ => None,
    })
}

/// Non-positive or missing counts fall back to the default.
pub fn clamp_workers(value: Option<i64>) -> usize {
    match value {
        Some(count) if count > 0 => usize::try_from(count).unwrap_or(DEFAULT_MAX_WORKERS),
        _ => DEFAULT_MAX_WORKERS,
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn read(path: &Utf8Path) -> Result<Config, BatchError> {
        let content = fs::read_to_string(path.as_std_path())
            .map_err(|err| BatchError::ConfigRead {
                path: path.to_path_buf(),
                reason: err.to_string(),
            })?;
        serde_json::from_str(&content).map_err(|err| BatchError::ConfigParse(err.to_string()))
    }

    /// Loads the config, treating a missing or broken file as empty.
    pub fn load_or_default(path: &Utf8Path) -> Config {
        if !path.as_std_path().exists() {
            tracing::debug!(%path, "no config file, using defaults");
            return Config::default();
        }
        match Self::read(path) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(%path, error = %err, "config file is corrupt, ignoring it");
                Config::default()
            }
        }
    }

    pub fn save(path: &Utf8Path, config: &Config) -> Result<(), BatchError> {
        let content = serde_json::to_vec_pretty(config)
            .map_err(|err| BatchError::Filesystem(err.to_string()))?;
        store::write_bytes_atomic(path, &content)?;
        tracing::info!(%path, "config saved");
        Ok(())
    }
}

/// Everything the worker pool, retry loop and downloader adapter need, fixed
/// for the length of a batch.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub archive: ArchiveStore,
    pub retries: u32,
    pub max_workers: usize,
    pub output_template: String,
}

impl OrchestratorConfig {
    pub fn new(archive: ArchiveStore, max_workers: usize) -> Self {
        Self {
            archive,
            retries: DEFAULT_RETRIES,
            max_workers: max_workers.max(1),
            output_template: OUTPUT_TEMPLATE.to_string(),
        }
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries.max(1);
        self
    }
}
