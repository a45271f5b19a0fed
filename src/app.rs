use camino::Utf8Path;
use serde::Serialize;

use crate::config::OrchestratorConfig;
use crate::domain::Task;
use crate::downloader::DownloaderClient;
use crate::error::BatchError;
use crate::executor::{CancelToken, RetryExecutor, TaskOutcome};
use crate::pool::WorkerPool;
use crate::summary::{self, BatchSummary};

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub summary: BatchSummary,
    pub outcomes: Vec<TaskOutcome>,
}

/// Wires the worker pool, the retry loop and a downloader together for one
/// batch.
pub struct App<C: DownloaderClient> {
    client: C,
    config: OrchestratorConfig,
}

impl<C: DownloaderClient> App<C> {
    pub fn new(client: C, config: OrchestratorConfig) -> Self {
        Self { client, config }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Runs every task to a terminal outcome and summarizes the batch. Only an
    /// interrupt makes this fail; individual task failures end up as skipped.
    pub fn run_batch(
        &self,
        tasks: Vec<Task>,
        destination_dir: &Utf8Path,
        cancel: &CancelToken,
    ) -> Result<BatchReport, BatchError> {
        let pool = WorkerPool::new(self.config.max_workers);
        let executor = RetryExecutor::new(self.config.retries);
        tracing::debug!(
            workers = pool.max_workers(),
            retries = executor.retries(),
            "batch limits"
        );

        let outcomes = pool.run_until(tasks, &executor, &self.client, cancel)?;
        let summary = summary::summarize(&outcomes, destination_dir);
        tracing::info!(
            total = summary.total,
            succeeded = summary.succeeded,
            skipped = summary.skipped,
            "batch complete"
        );

        Ok(BatchReport { summary, outcomes })
    }
}
