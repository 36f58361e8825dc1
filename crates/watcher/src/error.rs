//! Watcher error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors returned by [`DirectoryWatcher::start`](crate::DirectoryWatcher::start)
#[derive(Debug, Error)]
pub enum WatchError {
    /// Directory missing or inaccessible at subscribe time. Not retried.
    #[error("cannot watch {}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    /// `start` called while the worker is already running
    #[error("watcher for {} is already running", .0.display())]
    AlreadyRunning(PathBuf),

    /// Worker thread could not be spawned
    #[error("failed to spawn watcher thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Why a worker's run loop ended
#[derive(Debug, Error)]
pub enum LoopExit {
    /// `stop` was requested
    #[error("stopped")]
    Stopped,

    /// The OS dropped events and asked for a rescan
    #[error("notification overflow")]
    Overflow,

    /// The notification source reported an error
    #[error("notification error: {0}")]
    Notify(#[from] notify::Error),

    /// The notification feed closed underneath the worker
    #[error("notification channel disconnected")]
    Disconnected,
}

impl LoopExit {
    /// Whether the loop ended without being asked to
    pub fn is_failure(&self) -> bool {
        !matches!(self, LoopExit::Stopped)
    }
}
