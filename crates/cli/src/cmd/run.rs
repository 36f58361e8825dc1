//! Watch the configured folders until asked to stop

use anyhow::{Context, Result};
use cli_lib::locks::InstanceLock;
use cli_lib::system_config::{self, SystemConfig};
use cli_lib::ArchiveExtractor;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use watcher::{DirectoryWatcher, SettleHandler};

/// How often to check for watchers whose loop ended on its own
const HEALTH_INTERVAL: Duration = Duration::from_secs(5);

pub async fn run(config_path: &Path) -> Result<()> {
    let config = system_config::load_from(config_path)?;
    config.validate().context("Invalid configuration")?;

    let lock_dir = system_config::runtime_dir()?;
    let _lock = InstanceLock::acquire(&lock_dir)?;

    let extractor = Arc::new(ArchiveExtractor::from_config(&config));
    let watchers = start_watchers(&config, Arc::clone(&extractor) as Arc<dyn SettleHandler>);
    if watchers.is_empty() {
        anyhow::bail!("None of the configured folders could be watched");
    }

    info!(
        folders = watchers.len(),
        extensions = ?config.extensions(),
        "AutoUnpack running (Ctrl-C to exit)"
    );

    wait_for_shutdown(&watchers, &extractor).await?;

    info!("Shutting down");
    tokio::task::spawn_blocking(move || {
        for watcher in &watchers {
            watcher.stop();
        }
    })
    .await
    .context("Failed to stop watchers")?;

    Ok(())
}

/// Start one watcher per folder; folders that fail to open are reported and skipped
pub fn start_watchers(config: &SystemConfig, handler: Arc<dyn SettleHandler>) -> Vec<DirectoryWatcher> {
    config
        .watch_configs()
        .into_iter()
        .filter_map(|watch| {
            let watcher = DirectoryWatcher::new(watch, Arc::clone(&handler));
            match watcher.start() {
                Ok(()) => Some(watcher),
                Err(e) => {
                    error!("Skipping folder: {}", e);
                    None
                }
            }
        })
        .collect()
}

#[cfg(unix)]
async fn wait_for_shutdown(watchers: &[DirectoryWatcher], extractor: &ArchiveExtractor) -> Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut health = tokio::time::interval(HEALTH_INTERVAL);
    let mut reported = vec![false; watchers.len()];
    let mut terminate =
        signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;
    // SIGUSR1 pauses/resumes extraction without stopping the watchers
    let mut toggle =
        signal(SignalKind::user_defined1()).context("Failed to install SIGUSR1 handler")?;

    loop {
        tokio::select! {
            res = tokio::signal::ctrl_c() => return res.context("Failed to wait for Ctrl-C"),
            _ = terminate.recv() => return Ok(()),
            _ = toggle.recv() => {
                let enabled = extractor.toggle();
                info!(enabled, "Extraction {}", if enabled { "enabled" } else { "disabled" });
            }
            _ = health.tick() => report_dead(watchers, &mut reported),
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown(watchers: &[DirectoryWatcher], _extractor: &ArchiveExtractor) -> Result<()> {
    let mut health = tokio::time::interval(HEALTH_INTERVAL);
    let mut reported = vec![false; watchers.len()];

    loop {
        tokio::select! {
            res = tokio::signal::ctrl_c() => return res.context("Failed to wait for Ctrl-C"),
            _ = health.tick() => report_dead(watchers, &mut reported),
        }
    }
}

/// Log once for each watcher that is no longer running
fn report_dead(watchers: &[DirectoryWatcher], reported: &mut [bool]) {
    for (watcher, reported) in watchers.iter().zip(reported.iter_mut()) {
        if !*reported && !watcher.is_running() {
            warn!(dir = %watcher.directory().display(), "Folder is no longer being watched");
            *reported = true;
        }
    }
}
