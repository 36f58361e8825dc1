//! Idle policy: ingesting actions and sweeping the tracked table
//!
//! Both entry points take the current instant explicitly and stat files
//! through a [`FileProbe`], so the policy runs the same under test as on
//! the worker thread.

use crate::config::WatchConfig;
use crate::event::FileAction;
use crate::table::{FileStat, TrackedFiles, Upsert};
use smallvec::SmallVec;
use std::ffi::{OsStr, OsString};
use std::io;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, trace};

/// A file that stopped changing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettledFile {
    /// Watched directory, as configured
    pub directory: PathBuf,
    /// Name relative to `directory`
    pub file_name: OsString,
    /// `directory` joined with `file_name`
    pub full_path: PathBuf,
}

/// Source of file write time and size
pub trait FileProbe {
    fn stat(&self, path: &Path) -> io::Result<FileStat>;
}

/// [`FileProbe`] backed by `std::fs::metadata`
#[derive(Debug, Clone, Copy, Default)]
pub struct FsProbe;

impl FileProbe for FsProbe {
    fn stat(&self, path: &Path) -> io::Result<FileStat> {
        let metadata = std::fs::metadata(path)?;
        Ok(FileStat {
            modified: metadata.modified()?,
            len: metadata.len(),
            is_file: metadata.is_file(),
        })
    }
}

/// Tracked table plus the policy that decides when its entries settle
#[derive(Debug)]
pub struct SettleTracker<P = FsProbe> {
    /// Reported to the handler
    directory: PathBuf,
    /// Where files are stat'ed; the resolved form of `directory`
    scan_dir: PathBuf,
    idle_timeout: Duration,
    max_file_size: u64,
    table: TrackedFiles,
    probe: P,
}

impl<P: FileProbe> SettleTracker<P> {
    pub fn new(config: &WatchConfig, scan_dir: PathBuf, probe: P) -> Self {
        Self {
            directory: config.directory.clone(),
            scan_dir,
            idle_timeout: config.idle_timeout,
            max_file_size: config.max_file_size,
            table: TrackedFiles::with_capacity(config.max_tracked_files),
            probe,
        }
    }

    pub fn table(&self) -> &TrackedFiles {
        &self.table
    }

    /// Apply one decoded notification
    ///
    /// Upserts are filtered by size before they touch the table; a file
    /// already over the cap is dropped from tracking outright.
    pub fn apply(&mut self, name: &OsStr, action: FileAction, now: Instant) {
        if !action.is_upsert() {
            if self.table.remove(name) {
                trace!(file = ?name, "stopped tracking removed file");
            }
            return;
        }

        let stat = match self.probe.stat(&self.scan_dir.join(name)) {
            Ok(stat) if stat.is_file => stat,
            Ok(_) => return,
            Err(e) => {
                trace!(file = ?name, error = %e, "stat failed on notification");
                return;
            }
        };

        if stat.len > self.max_file_size {
            self.table.remove(name);
            debug!(file = ?name, size = stat.len, "file exceeds size cap; not tracking");
            return;
        }

        match self.table.upsert(name, stat.modified, now) {
            Upsert::Inserted => debug!(file = ?name, ?action, "tracking file"),
            Upsert::Refreshed => trace!(file = ?name, "write time advanced"),
            Upsert::Unchanged => {}
            Upsert::Full => debug!(
                file = ?name,
                capacity = self.table.capacity(),
                "tracked-file table full; not tracking"
            ),
        }
    }

    /// Re-stat every tracked file and report the ones that went idle
    ///
    /// Vanished and oversized files are dropped silently. A write time that
    /// moved without a notification still restarts the idle clock. Settled
    /// files are removed before `on_settled` sees them, so each fires once.
    pub fn sweep<F>(&mut self, now: Instant, mut on_settled: F) -> usize
    where
        F: FnMut(&SettledFile),
    {
        self.try_sweep(now, |file| {
            on_settled(file);
            ControlFlow::Continue(())
        })
    }

    /// [`sweep`](Self::sweep) whose callback can cut the pass short
    ///
    /// Files settled in this pass but not yet reported when `on_settled`
    /// breaks are dropped from tracking unreported. Returns the number of
    /// files reported.
    pub fn try_sweep<F>(&mut self, now: Instant, mut on_settled: F) -> usize
    where
        F: FnMut(&SettledFile) -> ControlFlow<()>,
    {
        let mut settled: SmallVec<[OsString; 8]> = SmallVec::new();
        let scan_dir = &self.scan_dir;
        let probe = &self.probe;
        let idle_timeout = self.idle_timeout;
        let max_file_size = self.max_file_size;

        self.table.retain(|name, record| {
            let stat = match probe.stat(&scan_dir.join(name)) {
                Ok(stat) if stat.is_file => stat,
                Ok(_) => return false,
                Err(e) => {
                    trace!(file = ?name, error = %e, "tracked file vanished");
                    return false;
                }
            };

            if stat.len > max_file_size {
                debug!(file = ?name, size = stat.len, "file grew past size cap; dropping");
                return false;
            }

            if record.observe(stat.modified, now) {
                trace!(file = ?name, "write observed by sweep");
            }

            if now.saturating_duration_since(record.last_change) >= idle_timeout {
                settled.push(name.to_os_string());
                return false;
            }
            true
        });

        let mut reported = 0;
        for file_name in &settled {
            let file = SettledFile {
                directory: self.directory.clone(),
                full_path: self.directory.join(file_name),
                file_name: file_name.clone(),
            };
            if on_settled(&file).is_break() {
                debug!(skipped = settled.len() - reported, "sweep cut short");
                break;
            }
            info!(path = %file.full_path.display(), "file settled");
            reported += 1;
        }

        reported
    }
}
