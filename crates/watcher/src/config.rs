//! Per-directory watch settings

use std::path::PathBuf;
use std::time::Duration;

/// Maximum number of files tracked at once per directory
pub const MAX_TRACKED_FILES: usize = 8;

/// Default idle timeout before a file counts as settled
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_millis(1000);

/// Default size cap, in MB
pub const DEFAULT_MAX_FILE_SIZE_MB: u64 = 250;

/// Bounded wait on the notification feed; also the sweep cadence
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_millis(100);

const BYTES_PER_MB: u64 = 1_000_000;

/// Watch settings for a single directory
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Directory to watch (non-recursive)
    pub directory: PathBuf,
    /// How long a file's write time must stay unchanged
    pub idle_timeout: Duration,
    /// Files larger than this are never reported
    pub max_file_size: u64,
    /// Timeout of the bounded wait between sweeps
    pub sweep_interval: Duration,
    /// Capacity of the tracked-file table
    pub max_tracked_files: usize,
}

impl WatchConfig {
    /// Settings for `directory` with all defaults applied
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            max_file_size: DEFAULT_MAX_FILE_SIZE_MB * BYTES_PER_MB,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            max_tracked_files: MAX_TRACKED_FILES,
        }
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Size cap in MB (1 MB = 1,000,000 bytes)
    pub fn with_max_file_size_mb(mut self, megabytes: u64) -> Self {
        self.max_file_size = megabytes.saturating_mul(BYTES_PER_MB);
        self
    }

    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    pub fn with_sweep_interval(mut self, sweep_interval: Duration) -> Self {
        self.sweep_interval = sweep_interval;
        self
    }

    pub fn with_max_tracked_files(mut self, capacity: usize) -> Self {
        self.max_tracked_files = capacity;
        self
    }
}
