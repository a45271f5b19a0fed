use std::fmt;
use std::sync::LazyLock;

use camino::{Utf8Path, Utf8PathBuf};
use clap::ValueEnum;
use regex::Regex;
use serde::Serialize;

static LOCATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^https?://\S+$").expect("locator pattern is valid"));

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Quality {
    #[default]
    Source,
    #[value(name = "1080p")]
    P1080,
    #[value(name = "720p")]
    P720,
    #[value(name = "480p")]
    P480,
    #[value(name = "audio")]
    AudioOnly,
}

impl Quality {
    /// Format selector handed to `yt-dlp -f`.
    pub fn format_spec(self) -> &'static str {
        match self {
            Quality::Source => "best",
            Quality::P1080 => "bestvideo[height<=1080]+bestaudio/best",
            Quality::P720 => "bestvideo[height<=720]+bestaudio/best",
            Quality::P480 => "bestvideo[height<=480]+bestaudio/best",
            Quality::AudioOnly => "bestaudio",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quality::Source => write!(f, "source"),
            Quality::P1080 => write!(f, "1080p"),
            Quality::P720 => write!(f, "720p"),
            Quality::P480 => write!(f, "480p"),
            Quality::AudioOnly => write!(f, "audio"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TaskId(u64);

impl TaskId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One requested download. Only [`TaskBuilder`] creates these, so every task
/// carries a locator that passed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    id: TaskId,
    locator: String,
    format_spec: String,
    destination_dir: Utf8PathBuf,
}

impl Task {
    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn locator(&self) -> &str {
        &self.locator
    }

    pub fn format_spec(&self) -> &str {
        &self.format_spec
    }

    pub fn destination_dir(&self) -> &Utf8Path {
        &self.destination_dir
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Valid(Task),
    Rejected { input: String, reason: String },
}

pub fn looks_like_url(value: &str) -> bool {
    LOCATOR_RE.is_match(value)
}

/// Turns raw locator strings into tasks that share one format and destination.
#[derive(Debug, Clone)]
pub struct TaskBuilder {
    format_spec: String,
    destination_dir: Utf8PathBuf,
    next_id: u64,
}

impl TaskBuilder {
    pub fn new(quality: Quality, destination_dir: Utf8PathBuf) -> Self {
        Self::with_format_spec(quality.format_spec(), destination_dir)
    }

    pub fn with_format_spec(format_spec: &str, destination_dir: Utf8PathBuf) -> Self {
        Self {
            format_spec: format_spec.to_string(),
            destination_dir,
            next_id: 1,
        }
    }

    pub fn validate(&mut self, raw: &str) -> Validation {
        let locator = raw.trim();
        if locator.is_empty() {
            return Validation::Rejected {
                input: raw.to_string(),
                reason: "empty locator".to_string(),
            };
        }
        if !looks_like_url(locator) {
            return Validation::Rejected {
                input: raw.to_string(),
                reason: "not an http(s) URL".to_string(),
            };
        }

        let id = TaskId(self.next_id);
        self.next_id += 1;
        Validation::Valid(Task {
            id,
            locator: locator.to_string(),
            format_spec: self.format_spec.clone(),
            destination_dir: self.destination_dir.clone(),
        })
    }

    /// Validates every input, logging and dropping the rejected ones.
    pub fn build_all<I, S>(&mut self, inputs: I) -> Vec<Task>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        inputs
            .into_iter()
            .filter_map(|raw| match self.validate(raw.as_ref()) {
                Validation::Valid(task) => Some(task),
                Validation::Rejected { input, reason } => {
                    tracing::warn!(locator = %input, %reason, "ignoring invalid locator");
                    None
                }
            })
            .collect()
    }
}
