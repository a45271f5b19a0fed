use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum BatchError {
    #[error("download directory must not be empty")]
    #[diagnostic(help("pass --dir or set download_dir in the config file"))]
    MissingDestination,

    #[error("failed to read config file at {path}: {reason}")]
    ConfigRead { path: Utf8PathBuf, reason: String },

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("required tool not found: {0}")]
    #[diagnostic(help("install yt-dlp and make sure it is on PATH"))]
    MissingTool(String),

    #[error("failed to read input: {0}")]
    Input(String),

    #[error("notification failed: {0}")]
    Notification(String),

    #[error("interrupted by user")]
    Interrupted,
}
