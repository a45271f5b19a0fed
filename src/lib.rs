//! Batch downloader that runs `yt-dlp` over a bounded pool of worker threads.
//!
//! Each task is retried a fixed number of times; anything yt-dlp already
//! recorded in the shared download archive is skipped by yt-dlp itself.

pub mod app;
pub mod config;
pub mod domain;
pub mod downloader;
pub mod error;
pub mod executor;
pub mod input;
pub mod notify;
pub mod output;
pub mod pool;
pub mod store;
pub mod summary;
