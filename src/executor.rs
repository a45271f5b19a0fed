use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;

use crate::config::DEFAULT_RETRIES;
use crate::domain::Task;
use crate::downloader::{AttemptOutcome, DownloaderClient};
use crate::error::BatchError;

/// Shared flag flipped by the interrupt handler.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AttemptResult {
    pub attempt: u32,
    pub outcome: AttemptOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FinalStatus {
    Succeeded,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskOutcome {
    pub task: Task,
    pub status: FinalStatus,
    pub attempts_used: u32,
    pub attempts: Vec<AttemptResult>,
}

/// Runs one task up to `retries` times back to back.
///
/// yt-dlp already retries network errors internally (`--retries`), so this
/// loop only exists to survive the whole process dying, and does not sleep
/// between attempts.
#[derive(Debug, Clone, Copy)]
pub struct RetryExecutor {
    retries: u32,
}

impl Default for RetryExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_RETRIES)
    }
}

impl RetryExecutor {
    pub fn new(retries: u32) -> Self {
        Self {
            retries: retries.max(1),
        }
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    pub fn execute(&self, task: Task, client: &dyn DownloaderClient) -> TaskOutcome {
        match self.execute_until(task, client, &CancelToken::new()) {
            Ok(outcome) => outcome,
            // A fresh token is never cancelled.
            Err(_) => unreachable!("uncancelled retry loop returned an error"),
        }
    }

    /// Like [`execute`](Self::execute), but gives up before starting a new
    /// attempt once `cancel` is set.
    pub fn execute_until(
        &self,
        task: Task,
        client: &dyn DownloaderClient,
        cancel: &CancelToken,
    ) -> Result<TaskOutcome, BatchError> {
        let mut attempts = Vec::with_capacity(self.retries as usize);

        for attempt in 1..=self.retries {
            if cancel.is_cancelled() {
                return Err(BatchError::Interrupted);
            }

            tracing::info!(
                task = %task.id(),
                locator = task.locator(),
                attempt,
                of = self.retries,
                "starting download"
            );
            let outcome = client.fetch(&task);
            attempts.push(AttemptResult { attempt, outcome });

            match outcome {
                AttemptOutcome::Success => {
                    tracing::info!(task = %task.id(), attempt, "download finished");
                    return Ok(TaskOutcome {
                        task,
                        status: FinalStatus::Succeeded,
                        attempts_used: attempt,
                        attempts,
                    });
                }
                AttemptOutcome::ProcessFailure(code) => {
                    tracing::warn!(task = %task.id(), attempt, exit_code = ?code, "download failed");
                }
            }
        }

        tracing::error!(
            task = %task.id(),
            locator = task.locator(),
            attempts = self.retries,
            "giving up after repeated failures, skipping"
        );
        Ok(TaskOutcome {
            task,
            status: FinalStatus::Skipped,
            attempts_used: self.retries,
            attempts,
        })
    }
}
