//! Bounded table of files under observation
//!
//! One record per file name. Presence in the table is what marks a record
//! active; deactivating a record removes it, so a later re-creation of the
//! same name starts from scratch.

use ahash::AHashMap;
use std::ffi::{OsStr, OsString};
use std::time::{Instant, SystemTime};

/// Freshly observed file state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    /// Last write time reported by the filesystem
    pub modified: SystemTime,
    /// Size in bytes
    pub len: u64,
    /// Regular file (directories and other entries are never tracked)
    pub is_file: bool,
}

/// Idle-detection state for one file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackedFileRecord {
    /// Write time seen at the last observation
    pub last_write: SystemTime,
    /// When `last_write` last actually changed
    pub last_change: Instant,
}

impl TrackedFileRecord {
    /// Record a fresh write time; the idle clock only restarts if it moved
    pub fn observe(&mut self, write: SystemTime, now: Instant) -> bool {
        if write == self.last_write {
            return false;
        }
        self.last_write = write;
        self.last_change = now;
        true
    }
}

/// Result of [`TrackedFiles::upsert`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// New record created
    Inserted,
    /// Existing record saw a new write time; idle clock restarted
    Refreshed,
    /// Existing record, same write time; idle clock untouched
    Unchanged,
    /// Table at capacity; the file is not tracked
    Full,
}

/// Capacity-bounded map from file name to idle state
#[derive(Debug)]
pub struct TrackedFiles {
    records: AHashMap<OsString, TrackedFileRecord>,
    capacity: usize,
}

impl TrackedFiles {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: AHashMap::with_capacity(capacity),
            capacity,
        }
    }

    /// Insert or refresh the record for `name`
    ///
    /// When the table is full, new names are silently left untracked until
    /// a slot frees up.
    pub fn upsert(&mut self, name: &OsStr, write: SystemTime, now: Instant) -> Upsert {
        if let Some(record) = self.records.get_mut(name) {
            return if record.observe(write, now) {
                Upsert::Refreshed
            } else {
                Upsert::Unchanged
            };
        }

        if self.is_full() {
            return Upsert::Full;
        }

        self.records.insert(
            name.to_os_string(),
            TrackedFileRecord {
                last_write: write,
                last_change: now,
            },
        );
        Upsert::Inserted
    }

    /// Drop the record for `name`; unknown names are a no-op
    pub fn remove(&mut self, name: &OsStr) -> bool {
        self.records.remove(name).is_some()
    }

    pub fn get(&self, name: &OsStr) -> Option<&TrackedFileRecord> {
        self.records.get(name)
    }

    pub fn contains(&self, name: &OsStr) -> bool {
        self.records.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.records.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Visit every record, keeping those for which `f` returns true
    pub(crate) fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&OsStr, &mut TrackedFileRecord) -> bool,
    {
        self.records.retain(|name, record| f(name, record));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn t(secs: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
    }

    #[test]
    fn test_upsert_only_restarts_clock_on_new_write_time() {
        let mut table = TrackedFiles::with_capacity(8);
        let start = Instant::now();
        let name = OsStr::new("a.zip");

        assert_eq!(table.upsert(name, t(10), start), Upsert::Inserted);

        // Duplicate event, same write time
        let later = start + Duration::from_millis(400);
        assert_eq!(table.upsert(name, t(10), later), Upsert::Unchanged);
        assert_eq!(table.get(name).unwrap().last_change, start);

        // Real write
        assert_eq!(table.upsert(name, t(11), later), Upsert::Refreshed);
        let record = table.get(name).unwrap();
        assert_eq!(record.last_change, later);
        assert_eq!(record.last_write, t(11));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_capacity_bound() {
        let mut table = TrackedFiles::with_capacity(2);
        let now = Instant::now();

        assert_eq!(table.upsert(OsStr::new("a"), t(1), now), Upsert::Inserted);
        assert_eq!(table.upsert(OsStr::new("b"), t(1), now), Upsert::Inserted);
        assert!(table.is_full());
        assert_eq!(table.upsert(OsStr::new("c"), t(1), now), Upsert::Full);
        assert!(!table.contains(OsStr::new("c")));

        // Existing names still refresh while full
        assert_eq!(table.upsert(OsStr::new("a"), t(2), now), Upsert::Refreshed);

        // A freed slot is reusable
        assert!(table.remove(OsStr::new("b")));
        assert_eq!(table.upsert(OsStr::new("c"), t(1), now), Upsert::Inserted);
    }

    #[test]
    fn test_remove_unknown_is_noop() {
        let mut table = TrackedFiles::with_capacity(8);
        assert!(!table.remove(OsStr::new("never-seen.zip")));
        assert!(table.is_empty());
    }
}
