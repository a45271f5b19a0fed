use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::executor::{FinalStatus, TaskOutcome};
use crate::notify::Notification;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub destination_dir: Utf8PathBuf,
    pub finished_at: DateTime<Utc>,
}

pub fn summarize(outcomes: &[TaskOutcome], destination_dir: &Utf8Path) -> BatchSummary {
    let succeeded = outcomes
        .iter()
        .filter(|outcome| outcome.status == FinalStatus::Succeeded)
        .count();
    let skipped = outcomes
        .iter()
        .filter(|outcome| outcome.status == FinalStatus::Skipped)
        .count();

    BatchSummary {
        total: outcomes.len(),
        succeeded,
        skipped,
        destination_dir: destination_dir.to_path_buf(),
        finished_at: Utc::now(),
    }
}

impl BatchSummary {
    /// The single completion event for a batch, sent even when nothing ran.
    pub fn notification(&self) -> Notification {
        let mut body = format!("Finished {} task(s)", self.total);
        if self.skipped > 0 {
            body.push_str(&format!(" ({} skipped)", self.skipped));
        }
        body.push_str(&format!("\nSaved to:\n{}", self.destination_dir));
        Notification {
            title: "Downloads complete".to_string(),
            body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_batch_has_zero_counts() {
        let summary = summarize(&[], Utf8Path::new("/videos"));
        assert_eq!((summary.total, summary.succeeded, summary.skipped), (0, 0, 0));
        let notification = summary.notification();
        assert!(notification.body.contains("Finished 0 task(s)"));
        assert!(notification.body.contains("/videos"));
    }
}
