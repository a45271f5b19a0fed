use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use camino::Utf8PathBuf;

use vod_batch::domain::{Quality, Task, TaskBuilder};
use vod_batch::downloader::{AttemptOutcome, DownloaderClient};
use vod_batch::executor::{FinalStatus, RetryExecutor};
use vod_batch::pool::WorkerPool;

/// Fails a task's first `failures[locator]` attempts, then succeeds. Tracks
/// how many fetches are in flight at once.
#[derive(Default)]
struct FlakyClient {
    failures: HashMap<String, u32>,
    calls: Mutex<HashMap<String, u32>>,
    active: AtomicUsize,
    peak: AtomicUsize,
    delay: Duration,
}

impl FlakyClient {
    fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    fn failing(mut self, locator: &str, times: u32) -> Self {
        self.failures.insert(locator.to_string(), times);
        self
    }

    fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

impl DownloaderClient for FlakyClient {
    fn fetch(&self, task: &Task) -> AttemptOutcome {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        thread::sleep(self.delay);

        let call = {
            let mut calls = self.calls.lock().unwrap();
            let count = calls.entry(task.locator().to_string()).or_insert(0);
            *count += 1;
            *count
        };
        self.active.fetch_sub(1, Ordering::SeqCst);

        let allowed = self.failures.get(task.locator()).copied().unwrap_or(0);
        if call > allowed {
            AttemptOutcome::Success
        } else {
            AttemptOutcome::ProcessFailure(Some(1))
        }
    }
}

fn tasks(locators: &[&str]) -> Vec<Task> {
    TaskBuilder::new(Quality::Source, Utf8PathBuf::from("/videos")).build_all(locators)
}

fn numbered(count: usize) -> Vec<String> {
    (1..=count)
        .map(|n| format!("https://www.twitch.tv/videos/{n}"))
        .collect()
}

#[test]
fn every_task_gets_exactly_one_outcome() {
    let locators = numbered(12);
    let input = tasks(&locators.iter().map(String::as_str).collect::<Vec<_>>());
    let ids: HashSet<_> = input.iter().map(Task::id).collect();

    let client = FlakyClient::with_delay(Duration::from_millis(5));
    let outcomes = WorkerPool::new(3).run(input, &RetryExecutor::default(), &client);

    assert_eq!(outcomes.len(), 12);
    let seen: HashSet<_> = outcomes.iter().map(|o| o.task.id()).collect();
    assert_eq!(seen, ids);
}

#[test]
fn concurrency_never_exceeds_worker_limit() {
    let locators = numbered(10);
    let input = tasks(&locators.iter().map(String::as_str).collect::<Vec<_>>());

    let client = FlakyClient::with_delay(Duration::from_millis(20));
    let outcomes = WorkerPool::new(2).run(input, &RetryExecutor::default(), &client);

    assert_eq!(outcomes.len(), 10);
    assert!(client.peak() <= 2, "peak concurrency was {}", client.peak());
    assert!(client.peak() >= 1);
}

#[test]
fn one_bad_task_does_not_stop_the_others() {
    let locators = numbered(5);
    let input = tasks(&locators.iter().map(String::as_str).collect::<Vec<_>>());

    let client = FlakyClient::with_delay(Duration::from_millis(2)).failing(&locators[2], u32::MAX);
    let outcomes = WorkerPool::new(2).run(input, &RetryExecutor::new(3), &client);

    let succeeded = outcomes
        .iter()
        .filter(|o| o.status == FinalStatus::Succeeded)
        .count();
    let skipped: Vec<_> = outcomes
        .iter()
        .filter(|o| o.status == FinalStatus::Skipped)
        .collect();
    assert_eq!(outcomes.len(), 5);
    assert_eq!(succeeded, 4);
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0].task.locator(), locators[2]);
    assert_eq!(skipped[0].attempts_used, 3);
}

#[test]
fn third_attempt_success_counts_three_attempts() {
    let input = tasks(&["https://www.twitch.tv/videos/7"]);
    let client = FlakyClient::default().failing("https://www.twitch.tv/videos/7", 2);

    let outcomes = WorkerPool::new(1).run(input, &RetryExecutor::new(3), &client);

    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].status, FinalStatus::Succeeded);
    assert_eq!(outcomes[0].attempts_used, 3);
    assert_eq!(
        outcomes[0]
            .attempts
            .iter()
            .map(|a| a.outcome.is_success())
            .collect::<Vec<_>>(),
        vec![false, false, true]
    );
}

#[test]
fn attempts_stay_within_budget() {
    let locators = numbered(6);
    let input = tasks(&locators.iter().map(String::as_str).collect::<Vec<_>>());
    let client = FlakyClient::default()
        .failing(&locators[0], 1)
        .failing(&locators[1], 2)
        .failing(&locators[2], 5);

    let outcomes = WorkerPool::new(4).run(input, &RetryExecutor::new(3), &client);

    for outcome in &outcomes {
        assert!((1..=3).contains(&outcome.attempts_used));
        assert_eq!(outcome.attempts.len() as u32, outcome.attempts_used);
        let last_failed = !outcome.attempts.last().unwrap().outcome.is_success();
        assert_eq!(
            outcome.status == FinalStatus::Skipped,
            outcome.attempts_used == 3 && last_failed
        );
    }
}

#[test]
fn duplicate_locators_are_not_deduplicated_here() {
    let input = tasks(&["https://www.twitch.tv/videos/1", "https://www.twitch.tv/videos/1"]);
    let client = FlakyClient::default();

    let outcomes = WorkerPool::new(2).run(input, &RetryExecutor::default(), &client);

    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.iter().all(|o| o.status == FinalStatus::Succeeded));
    assert_ne!(outcomes[0].task.id(), outcomes[1].task.id());
}
