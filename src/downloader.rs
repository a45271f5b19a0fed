use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Serialize;

use crate::config::{DOWNLOADER_BINARY, OrchestratorConfig};
use crate::domain::Task;
use crate::error::BatchError;

/// Result of a single downloader run. Only the exit status matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "exit_code", rename_all = "snake_case")]
pub enum AttemptOutcome {
    Success,
    /// `None` when the process could not be started or was killed by a signal.
    ProcessFailure(Option<i32>),
}

impl AttemptOutcome {
    pub fn is_success(self) -> bool {
        matches!(self, AttemptOutcome::Success)
    }
}

pub trait DownloaderClient: Send + Sync {
    fn fetch(&self, task: &Task) -> AttemptOutcome;
}

#[derive(Debug, Clone)]
pub struct ToolInfo {
    pub path: String,
    pub version: Option<String>,
}

/// Runs yt-dlp as a child process, inheriting stdout and stderr so its
/// progress lines reach the terminal.
#[derive(Debug, Clone)]
pub struct YtDlpClient {
    program: PathBuf,
    config: OrchestratorConfig,
}

impl YtDlpClient {
    pub fn new(config: OrchestratorConfig) -> Result<Self, BatchError> {
        let program = find_in_path(DOWNLOADER_BINARY)
            .ok_or_else(|| BatchError::MissingTool(DOWNLOADER_BINARY.to_string()))?;
        Ok(Self::with_program(program, config))
    }

    pub fn with_program(program: PathBuf, config: OrchestratorConfig) -> Self {
        Self { program, config }
    }

    pub fn tool_info(&self) -> ToolInfo {
        ToolInfo {
            path: self.program.display().to_string(),
            version: tool_version(&self.program, &["--version"]),
        }
    }
}

impl DownloaderClient for YtDlpClient {
    fn fetch(&self, task: &Task) -> AttemptOutcome {
        let args = build_args(task, &self.config);
        tracing::debug!(task = %task.id(), program = %self.program.display(), ?args, "spawning downloader");

        match Command::new(&self.program).args(&args).status() {
            Ok(status) if status.success() => AttemptOutcome::Success,
            Ok(status) => AttemptOutcome::ProcessFailure(status.code()),
            Err(err) => {
                tracing::error!(
                    task = %task.id(),
                    program = %self.program.display(),
                    error = %err,
                    "failed to launch downloader"
                );
                AttemptOutcome::ProcessFailure(None)
            }
        }
    }
}

/// Full argument list for one attempt. Output naming and archive dedup both
/// depend on these staying exactly as they are.
pub fn build_args(task: &Task, config: &OrchestratorConfig) -> Vec<String> {
    let output = task.destination_dir().join(&config.output_template);
    vec![
        task.locator().to_string(),
        "-f".to_string(),
        task.format_spec().to_string(),
        "--merge-output-format".to_string(),
        "mp4".to_string(),
        "--concurrent-fragments".to_string(),
        "8".to_string(),
        "--retries".to_string(),
        "10".to_string(),
        "--fragment-retries".to_string(),
        "10".to_string(),
        "--newline".to_string(),
        "--progress".to_string(),
        "--download-archive".to_string(),
        config.archive.path().to_string(),
        "-o".to_string(),
        output.to_string(),
    ]
}

/// Looks `name` up on `PATH` the way a shell would, trying the Windows
/// `.exe` spelling first in each directory.
pub fn find_in_path(name: &str) -> Option<PathBuf> {
    let dirs = std::env::var_os("PATH")?;
    let candidates = [format!("{name}.exe"), name.to_string()];
    std::env::split_paths(&dirs)
        .flat_map(|dir| candidates.iter().map(move |file| dir.join(file)))
        .find(|candidate| candidate.is_file())
}

/// First line of `<tool> --version`, if the tool answers at all.
fn tool_version(program: &Path, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}
