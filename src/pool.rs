use std::collections::VecDeque;
use std::sync::{Mutex, mpsc};
use std::thread;

use crate::domain::Task;
use crate::downloader::DownloaderClient;
use crate::error::BatchError;
use crate::executor::{CancelToken, FinalStatus, RetryExecutor, TaskOutcome};

/// Fixed set of worker threads draining a shared task queue.
///
/// `run` blocks until every task has a terminal outcome. Outcomes come back
/// in completion order, not submission order.
#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    max_workers: usize,
}

impl WorkerPool {
    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers: max_workers.max(1),
        }
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    pub fn run(
        &self,
        tasks: Vec<Task>,
        executor: &RetryExecutor,
        client: &dyn DownloaderClient,
    ) -> Vec<TaskOutcome> {
        match self.run_until(tasks, executor, client, &CancelToken::new()) {
            Ok(outcomes) => outcomes,
            Err(_) => unreachable!("uncancelled pool returned an error"),
        }
    }

    /// Runs the batch, aborting as a whole once `cancel` is set. Outcomes of
    /// tasks that already finished are dropped in that case.
    pub fn run_until(
        &self,
        tasks: Vec<Task>,
        executor: &RetryExecutor,
        client: &dyn DownloaderClient,
        cancel: &CancelToken,
    ) -> Result<Vec<TaskOutcome>, BatchError> {
        if tasks.is_empty() {
            return Ok(Vec::new());
        }

        let total = tasks.len();
        let workers = self.max_workers.min(total);
        let queue = Mutex::new(VecDeque::from(tasks));
        let (tx, rx) = mpsc::channel::<Result<TaskOutcome, BatchError>>();

        tracing::info!(tasks = total, workers, "starting batch");

        let outcomes = thread::scope(|scope| {
            let queue = &queue;
            for _ in 0..workers {
                let tx = tx.clone();
                scope.spawn(move || {
                    loop {
                        if cancel.is_cancelled() {
                            break;
                        }
                        let next = queue.lock().ok().and_then(|mut queue| queue.pop_front());
                        let Some(task) = next else {
                            break;
                        };
                        let result = executor.execute_until(task, client, cancel);
                        let stop = result.is_err();
                        if tx.send(result).is_err() || stop {
                            break;
                        }
                    }
                });
            }
            drop(tx);

            let mut outcomes = Vec::with_capacity(total);
            for result in rx {
                match result {
                    Ok(outcome) => {
                        let status = match outcome.status {
                            FinalStatus::Succeeded => "succeeded",
                            FinalStatus::Skipped => "skipped",
                        };
                        tracing::info!(
                            task = %outcome.task.id(),
                            status,
                            done = outcomes.len() + 1,
                            total,
                            "task finished"
                        );
                        outcomes.push(outcome);
                    }
                    Err(_) => cancel.cancel(),
                }
            }
            outcomes
        });

        if cancel.is_cancelled() {
            tracing::warn!(
                finished = outcomes.len(),
                total,
                "batch interrupted, discarding results"
            );
            return Err(BatchError::Interrupted);
        }

        Ok(outcomes)
    }
}
