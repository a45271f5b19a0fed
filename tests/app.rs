use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use assert_matches::assert_matches;
use camino::{Utf8Path, Utf8PathBuf};

use vod_batch::app::App;
use vod_batch::config::OrchestratorConfig;
use vod_batch::domain::{Quality, Task, TaskBuilder};
use vod_batch::downloader::{AttemptOutcome, DownloaderClient};
use vod_batch::error::BatchError;
use vod_batch::executor::CancelToken;
use vod_batch::store::ArchiveStore;

/// Fails every attempt for locators containing `bad` and records each call.
#[derive(Default)]
struct MockDownloader {
    seen: Mutex<Vec<String>>,
}

impl DownloaderClient for MockDownloader {
    fn fetch(&self, task: &Task) -> AttemptOutcome {
        self.seen.lock().unwrap().push(task.locator().to_string());
        if task.locator().contains("bad") {
            AttemptOutcome::ProcessFailure(Some(1))
        } else {
            AttemptOutcome::Success
        }
    }
}

fn orchestrator(workers: usize) -> OrchestratorConfig {
    OrchestratorConfig::new(
        ArchiveStore::new(Utf8PathBuf::from("/data/downloaded.txt")),
        workers,
    )
}

#[test]
fn batch_summary_counts_skipped_tasks() {
    let destination = Utf8Path::new("/videos");
    let tasks = TaskBuilder::new(Quality::P1080, destination.to_path_buf()).build_all([
        "https://www.twitch.tv/videos/1",
        "https://www.twitch.tv/videos/2",
        "https://www.twitch.tv/videos/bad",
        "https://www.twitch.tv/videos/4",
        "https://www.twitch.tv/videos/5",
        "not a url",
    ]);
    assert_eq!(tasks.len(), 5);

    let app = App::new(MockDownloader::default(), orchestrator(2));
    let report = app
        .run_batch(tasks, destination, &CancelToken::new())
        .unwrap();

    assert_eq!(report.summary.total, 5);
    assert_eq!(report.summary.succeeded, 4);
    assert_eq!(report.summary.skipped, 1);
    assert_eq!(report.summary.destination_dir.as_str(), "/videos");

    // four single successes plus three attempts on the bad one
    let seen = app.client().seen.lock().unwrap();
    assert_eq!(seen.len(), 7);
    assert!(!seen.iter().any(|locator| locator == "not a url"));
}

#[test]
fn empty_batch_still_produces_a_summary() {
    let app = App::new(MockDownloader::default(), orchestrator(2));
    let report = app
        .run_batch(Vec::new(), Utf8Path::new("/videos"), &CancelToken::new())
        .unwrap();

    assert!(report.outcomes.is_empty());
    assert_eq!(
        (
            report.summary.total,
            report.summary.succeeded,
            report.summary.skipped
        ),
        (0, 0, 0)
    );
    assert!(report.summary.notification().body.contains("0 task(s)"));
}

#[test]
fn interrupt_aborts_without_report() {
    let tasks = TaskBuilder::new(Quality::Source, Utf8PathBuf::from("/videos"))
        .build_all(["https://www.twitch.tv/videos/1"]);
    let cancel = CancelToken::new();
    cancel.cancel();

    let app = App::new(MockDownloader::default(), orchestrator(1));
    let result = app.run_batch(tasks, Utf8Path::new("/videos"), &cancel);

    assert_matches!(result, Err(BatchError::Interrupted));
    assert!(app.client().seen.lock().unwrap().is_empty());
}

/// Presses "Ctrl-C" while its `cancel_on`-th download is running.
struct InterruptingDownloader {
    cancel: CancelToken,
    cancel_on: usize,
    calls: AtomicUsize,
}

impl DownloaderClient for InterruptingDownloader {
    fn fetch(&self, _task: &Task) -> AttemptOutcome {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call == self.cancel_on {
            self.cancel.cancel();
        }
        AttemptOutcome::Success
    }
}

#[test]
fn interrupt_mid_batch_stops_before_the_next_task() {
    let tasks = TaskBuilder::new(Quality::Source, Utf8PathBuf::from("/videos")).build_all(
        (1..=6).map(|n| format!("https://www.twitch.tv/videos/{n}")),
    );
    assert_eq!(tasks.len(), 6);

    let cancel = CancelToken::new();
    let client = InterruptingDownloader {
        cancel: cancel.clone(),
        cancel_on: 2,
        calls: AtomicUsize::new(0),
    };
    let app = App::new(client, orchestrator(1));
    let result = app.run_batch(tasks, Utf8Path::new("/videos"), &cancel);

    assert_matches!(result, Err(BatchError::Interrupted));
    assert_eq!(app.client().calls.load(Ordering::SeqCst), 2);
}

#[test]
fn report_serializes_to_json() {
    let tasks = TaskBuilder::new(Quality::AudioOnly, Utf8PathBuf::from("/videos"))
        .build_all(["https://www.twitch.tv/videos/1"]);
    let app = App::new(MockDownloader::default(), orchestrator(1));
    let report = app
        .run_batch(tasks, Utf8Path::new("/videos"), &CancelToken::new())
        .unwrap();

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["summary"]["succeeded"], 1);
    assert_eq!(json["outcomes"][0]["status"], "succeeded");
    assert_eq!(json["outcomes"][0]["task"]["format_spec"], "bestaudio");
}
