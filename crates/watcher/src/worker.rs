//! Per-directory run loop
//!
//! Notifications and sweeps share one thread. The loop blocks on a bounded
//! wait (notification, stop signal, or timeout) and sweeps after every
//! wake-up, so sweep cadence never depends on notification volume.

use crate::error::LoopExit;
use crate::event;
use crate::settle::{FsProbe, SettleTracker};
use crate::SettleHandler;
use crossbeam_channel::{select, Receiver, TryRecvError};
use notify::{Event, RecommendedWatcher};
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

pub(crate) struct Worker {
    pub(crate) tracker: SettleTracker<FsProbe>,
    /// Resolved directory; notify reports paths under it
    pub(crate) scan_dir: PathBuf,
    pub(crate) events: Receiver<notify::Result<Event>>,
    /// Set by the notify callback when the event buffer filled up
    pub(crate) overflowed: Arc<AtomicBool>,
    pub(crate) stop: Receiver<()>,
    /// Set by `stop` before it signals; suppresses callbacks still pending
    pub(crate) cancelled: Arc<AtomicBool>,
    pub(crate) sweep_interval: Duration,
    pub(crate) handler: Arc<dyn SettleHandler>,
    /// Held for the worker's lifetime and released when the loop exits
    pub(crate) _subscription: Option<RecommendedWatcher>,
}

impl Worker {
    pub(crate) fn run(mut self) -> LoopExit {
        let exit = match self.run_loop() {
            // Feed closing after a stop request is part of shutting down
            LoopExit::Disconnected if self.cancelled.load(Ordering::Acquire) => LoopExit::Stopped,
            exit => exit,
        };
        match &exit {
            LoopExit::Stopped => debug!(dir = %self.scan_dir.display(), "watcher stopped"),
            failure => warn!(
                dir = %self.scan_dir.display(),
                reason = %failure,
                "watch loop ended; directory is no longer watched"
            ),
        }
        exit
    }

    fn run_loop(&mut self) -> LoopExit {
        loop {
            select! {
                recv(self.stop) -> _ => return LoopExit::Stopped,
                recv(self.events) -> msg => {
                    let Ok(first) = msg else {
                        return LoopExit::Disconnected;
                    };
                    if let Err(exit) = self.handle(first) {
                        return exit;
                    }
                    // Take whatever else is already queued before sweeping
                    loop {
                        match self.events.try_recv() {
                            Ok(next) => {
                                if let Err(exit) = self.handle(next) {
                                    return exit;
                                }
                            }
                            Err(TryRecvError::Empty) => break,
                            Err(TryRecvError::Disconnected) => return LoopExit::Disconnected,
                        }
                    }
                }
                default(self.sweep_interval) => {}
            }

            if self.overflowed.load(Ordering::Acquire) {
                return LoopExit::Overflow;
            }
            if self.stop_requested() {
                return LoopExit::Stopped;
            }

            let handler = &self.handler;
            let cancelled = &self.cancelled;
            self.tracker.try_sweep(Instant::now(), |file| {
                // An earlier callback in this pass may have called stop
                if cancelled.load(Ordering::Acquire) {
                    return ControlFlow::Break(());
                }
                handler.on_file_settled(file);
                ControlFlow::Continue(())
            });
        }
    }

    fn handle(&mut self, result: notify::Result<Event>) -> Result<(), LoopExit> {
        let event = result?;
        if event.need_rescan() {
            return Err(LoopExit::Overflow);
        }

        let now = Instant::now();
        for (name, action) in event::decode(&event, &self.scan_dir) {
            self.tracker.apply(&name, action, now);
        }
        Ok(())
    }

    fn stop_requested(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
            || !matches!(self.stop.try_recv(), Err(TryRecvError::Empty))
    }
}
