//! Scheduler error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that stop or prevent a slideshow.
#[derive(Error, Debug)]
pub enum SchedulerError {
    /// Consecutive send failures crossed the configured threshold; the
    /// link is treated as gone. Distinct from ordinary per-item errors,
    /// which only skip the affected item.
    #[error("link unavailable: {failures} consecutive send failures")]
    LinkUnavailable {
        /// Consecutive failures observed when the scheduler gave up.
        failures: u32,
    },

    /// The media directory could not be enumerated.
    #[error("failed to read media directory {path}: {source}")]
    Io {
        /// Directory that failed to enumerate.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The filesystem watcher could not be set up.
    #[error("filesystem watch failed: {0}")]
    Watch(#[from] notify::Error),

    /// The scheduler task terminated abnormally.
    #[error("scheduler task terminated abnormally")]
    Task,
}
