use std::fs;
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use directories::BaseDirs;

use crate::error::BatchError;

const APP_DIR: &str = "vod-batch";
const CONFIG_FILE: &str = "config.json";
const ARCHIVE_FILE: &str = "downloaded.txt";

/// Where the config file and the download archive live.
#[derive(Debug, Clone)]
pub struct AppPaths {
    config_root: Utf8PathBuf,
    data_root: Utf8PathBuf,
}

impl AppPaths {
    pub fn new() -> Result<Self, BatchError> {
        let dirs = BaseDirs::new().ok_or_else(|| {
            BatchError::Filesystem("unable to resolve home directory".to_string())
        })?;
        let config_root = Utf8PathBuf::from_path_buf(dirs.config_dir().join(APP_DIR))
            .map_err(|_| BatchError::Filesystem("invalid config path".to_string()))?;
        let data_root = Utf8PathBuf::from_path_buf(dirs.data_dir().join(APP_DIR))
            .map_err(|_| BatchError::Filesystem("invalid data path".to_string()))?;

        Ok(Self {
            config_root,
            data_root,
        })
    }

    pub fn new_with_paths(config_root: Utf8PathBuf, data_root: Utf8PathBuf) -> Self {
        Self {
            config_root,
            data_root,
        }
    }

    pub fn config_path(&self) -> Utf8PathBuf {
        self.config_root.join(CONFIG_FILE)
    }

    pub fn archive_path(&self) -> Utf8PathBuf {
        self.data_root.join(ARCHIVE_FILE)
    }

    pub fn archive(&self) -> ArchiveStore {
        ArchiveStore::new(self.archive_path())
    }
}

/// The downloader's ledger of finished items.
///
/// yt-dlp appends to this file and skips anything already listed in it. We
/// only own its location: the contents are never read or written here, and
/// every concurrent download is given the same path so dedup holds across the
/// whole batch and across runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveStore {
    path: Utf8PathBuf,
}

impl ArchiveStore {
    pub fn new(path: Utf8PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Creates the parent directory so the downloader can append to the file.
    pub fn ensure_parent(&self) -> Result<(), BatchError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent.as_std_path())
                .map_err(|err| BatchError::Filesystem(format!("{parent}: {err}")))?;
        }
        Ok(())
    }
}

pub fn ensure_dir(path: &Utf8Path) -> Result<(), BatchError> {
    fs::create_dir_all(path.as_std_path())
        .map_err(|err| BatchError::Filesystem(format!("{path}: {err}")))
}

pub fn write_bytes_atomic(path: &Utf8Path, content: &[u8]) -> Result<(), BatchError> {
    let parent = path
        .parent()
        .ok_or_else(|| BatchError::Filesystem("invalid destination path".to_string()))?;
    ensure_dir(parent)?;
    let mut temp = tempfile::Builder::new()
        .prefix("vod-batch")
        .tempfile_in(parent.as_std_path())
        .map_err(|err| BatchError::Filesystem(err.to_string()))?;
    temp.write_all(content)
        .map_err(|err| BatchError::Filesystem(err.to_string()))?;
    temp.persist(path.as_std_path())
        .map_err(|err| BatchError::Filesystem(err.to_string()))?;
    Ok(())
}
