//! Idle-detection directory watching for AutoUnpack
//!
//! This crate decides when a file dropped into a watched directory has
//! stopped changing:
//! - One background worker per directory (non-recursive)
//! - Bounded table of in-flight candidate files
//! - Periodic sweep that re-stats every candidate, independent of
//!   notification arrival (backstop for overflow and coalescing)
//! - Single settle callback as the only output
//!
//! What happens to a settled file is up to the [`SettleHandler`].

pub mod config;
pub mod error;
pub mod event;
pub mod settle;
pub mod table;

mod watcher;
mod worker;

pub use config::WatchConfig;
pub use error::{LoopExit, WatchError};
pub use event::FileAction;
pub use settle::{FileProbe, FsProbe, SettledFile};
pub use table::{FileStat, TrackedFiles, Upsert};
pub use watcher::DirectoryWatcher;

/// Receiver of settle events
///
/// Invoked synchronously on the directory's worker thread, so a slow
/// handler delays notification processing and sweeps for that directory.
pub trait SettleHandler: Send + Sync + 'static {
    /// Called at most once per settle event for a file
    fn on_file_settled(&self, file: &SettledFile);
}

impl<F> SettleHandler for F
where
    F: Fn(&SettledFile) + Send + Sync + 'static,
{
    fn on_file_settled(&self, file: &SettledFile) {
        self(file)
    }
}
