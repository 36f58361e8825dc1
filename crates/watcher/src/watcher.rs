//! Start/stop control surface for one watched directory

use crate::config::WatchConfig;
use crate::error::{LoopExit, WatchError};
use crate::settle::{FsProbe, SettleTracker};
use crate::worker::Worker;
use crate::SettleHandler;
use crossbeam_channel::{bounded, Sender, TrySendError};
use notify::{Event, RecursiveMode, Watcher as _};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{info, warn};

/// Notifications buffered between the OS callback and the worker.
/// Filling it up counts as an overflow.
const EVENT_BUFFER: usize = 1024;

/// Watches one directory and reports files that stop changing
///
/// `start` and `stop` take `&self`, so the watcher can be shared (for
/// example in an `Arc`) and stopped from a different thread than the one
/// that started it. Dropping the watcher stops it.
pub struct DirectoryWatcher {
    config: WatchConfig,
    handler: Arc<dyn SettleHandler>,
    running: Mutex<Option<Running>>,
}

struct Running {
    stop_tx: Sender<()>,
    /// Checked by the worker before every callback
    cancelled: Arc<AtomicBool>,
    thread: JoinHandle<LoopExit>,
}

impl Running {
    /// Signal the worker and wait for it; the worker releases the subscription on exit
    fn shutdown(self) -> Option<LoopExit> {
        let Running {
            stop_tx,
            cancelled,
            thread: handle,
        } = self;

        cancelled.store(true, Ordering::Release);
        let _ = stop_tx.try_send(());
        drop(stop_tx);

        // Called from inside the handler: no further callbacks run, and the
        // loop exits once this one returns
        if handle.thread().id() == thread::current().id() {
            return None;
        }

        match handle.join() {
            Ok(exit) => Some(exit),
            Err(_) => {
                warn!("watcher thread panicked");
                None
            }
        }
    }
}

impl DirectoryWatcher {
    pub fn new(config: WatchConfig, handler: Arc<dyn SettleHandler>) -> Self {
        Self {
            config,
            handler,
            running: Mutex::new(None),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.config.directory
    }

    /// Subscribe to the directory and spawn its worker
    ///
    /// Fails with [`WatchError::Open`] if the directory cannot be watched;
    /// callers should report it and move on rather than retry. Calling this
    /// while the worker is running returns [`WatchError::AlreadyRunning`]
    /// and leaves the running worker alone.
    pub fn start(&self) -> Result<(), WatchError> {
        let mut running = self.running.lock();

        if let Some(current) = running.as_ref() {
            if !current.thread.is_finished() {
                return Err(WatchError::AlreadyRunning(self.config.directory.clone()));
            }
        }
        // A loop that ended on its own is reaped before resubscribing
        if let Some(dead) = running.take() {
            dead.shutdown();
        }

        let directory = &self.config.directory;
        let open_error = |source: notify::Error| WatchError::Open {
            path: directory.clone(),
            source,
        };

        let scan_dir = std::fs::canonicalize(directory)
            .map_err(|e| open_error(notify::Error::io(e)))?;
        if !scan_dir.is_dir() {
            return Err(open_error(notify::Error::generic("not a directory")));
        }

        let (event_tx, event_rx) = bounded(EVENT_BUFFER);
        let overflowed = Arc::new(AtomicBool::new(false));
        let overflow_flag = Arc::clone(&overflowed);
        let mut subscription = notify::recommended_watcher(move |res: notify::Result<Event>| {
            match event_tx.try_send(res) {
                Ok(()) | Err(TrySendError::Disconnected(_)) => {}
                Err(TrySendError::Full(_)) => overflow_flag.store(true, Ordering::Release),
            }
        })
        .map_err(open_error)?;
        subscription
            .watch(&scan_dir, RecursiveMode::NonRecursive)
            .map_err(open_error)?;

        let (stop_tx, stop_rx) = bounded(1);
        let cancelled = Arc::new(AtomicBool::new(false));
        let worker = Worker {
            tracker: SettleTracker::new(&self.config, scan_dir.clone(), FsProbe),
            scan_dir,
            events: event_rx,
            overflowed,
            stop: stop_rx,
            cancelled: Arc::clone(&cancelled),
            sweep_interval: self.config.sweep_interval,
            handler: Arc::clone(&self.handler),
            _subscription: Some(subscription),
        };

        let handle = thread::Builder::new()
            .name(format!("watch {}", directory.display()))
            .spawn(move || worker.run())?;

        info!(
            dir = %directory.display(),
            idle = ?self.config.idle_timeout,
            max_bytes = self.config.max_file_size,
            "watching directory"
        );

        *running = Some(Running {
            stop_tx,
            cancelled,
            thread: handle,
        });
        Ok(())
    }

    /// Stop the worker and release the subscription
    ///
    /// Safe to call repeatedly, before `start`, or after a failed `start`.
    /// Once it returns, the handler will not be invoked again. From inside
    /// the handler it does not wait for the worker, but the rest of the
    /// current sweep is skipped.
    pub fn stop(&self) {
        // Not joined under the lock
        let running = self.running.lock().take();
        if let Some(running) = running {
            running.shutdown();
            info!(dir = %self.config.directory.display(), "stopped watching directory");
        }
    }

    /// Whether the worker is alive; false once its loop has ended for any reason
    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .as_ref()
            .is_some_and(|running| !running.thread.is_finished())
    }
}

impl Drop for DirectoryWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for DirectoryWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryWatcher")
            .field("config", &self.config)
            .field("running", &self.is_running())
            .finish()
    }
}
