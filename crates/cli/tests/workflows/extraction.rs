//! Settled archives reach the extractor
//!
//! `true` stands in for the extraction program, so a successful
//! "extraction" is observable through `delete_after`.

#![cfg(unix)]

use anyhow::Result;
use cli_lib::ArchiveExtractor;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use watcher::{DirectoryWatcher, SettleHandler, WatchConfig};

const IDLE: Duration = Duration::from_millis(300);
const DEADLINE: Duration = Duration::from_secs(15);

fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < DEADLINE {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    condition()
}

fn start_extracting(dir: &Path, extractor: Arc<ArchiveExtractor>) -> Result<DirectoryWatcher> {
    let watcher = DirectoryWatcher::new(
        WatchConfig::new(dir).with_idle_timeout(IDLE),
        extractor as Arc<dyn SettleHandler>,
    );
    watcher.start()?;
    Ok(watcher)
}

#[test]
fn test_settled_archive_is_extracted_and_deleted() -> Result<()> {
    let temp = TempDir::new()?;
    let extractor = Arc::new(ArchiveExtractor::new("true", vec![".zip".to_string()], true));
    let watcher = start_extracting(temp.path(), extractor)?;

    let archive = temp.path().join("bundle.zip");
    let other = temp.path().join("notes.txt");
    std::fs::write(&archive, b"PK\x03\x04")?;
    std::fs::write(&other, b"hello")?;

    assert!(wait_until(|| !archive.exists()), "archive was not consumed");

    // Give the text file the same chance to settle; it must survive
    std::thread::sleep(IDLE * 3);
    assert!(other.exists());

    watcher.stop();
    Ok(())
}

#[test]
fn test_failed_extraction_keeps_archive() -> Result<()> {
    let temp = TempDir::new()?;
    let extractor = Arc::new(ArchiveExtractor::new("false", vec![".zip".to_string()], true));
    let watcher = start_extracting(temp.path(), extractor)?;

    let archive = temp.path().join("broken.zip");
    std::fs::write(&archive, b"not really")?;

    std::thread::sleep(IDLE * 5);
    assert!(archive.exists());

    watcher.stop();
    Ok(())
}

#[test]
fn test_disabled_extractor_ignores_archives() -> Result<()> {
    let temp = TempDir::new()?;
    let extractor = Arc::new(ArchiveExtractor::new("true", vec![".zip".to_string()], true));
    extractor.set_enabled(false);
    let watcher = start_extracting(temp.path(), Arc::clone(&extractor))?;

    let archive = temp.path().join("paused.zip");
    std::fs::write(&archive, b"PK")?;
    std::thread::sleep(IDLE * 5);
    assert!(archive.exists());

    // Re-enabling picks up the next settle
    extractor.set_enabled(true);
    std::fs::write(&archive, b"PK\x03\x04")?;
    assert!(wait_until(|| !archive.exists()));

    watcher.stop();
    Ok(())
}

/// Full binary: `run` until SIGTERM
#[cfg(target_os = "linux")]
#[test]
fn test_run_command_until_sigterm() -> Result<()> {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;
    use std::process::{Command, Stdio};

    let temp = TempDir::new()?;
    let watched = temp.path().join("downloads");
    let runtime = temp.path().join("runtime");
    std::fs::create_dir(&watched)?;
    std::fs::create_dir(&runtime)?;

    let config_path = temp.path().join("settings.toml");
    std::fs::write(
        &config_path,
        format!(
            "[settings]\nfolders = \"{}\"\nextensions = \".zip\"\nwait_time_ms = 300\nzip_exe = \"true\"\ndelete_after = true\n",
            watched.display()
        ),
    )?;

    let mut child = Command::new(env!("CARGO_BIN_EXE_autounpack"))
        .arg("--config")
        .arg(&config_path)
        .arg("run")
        .env("XDG_RUNTIME_DIR", &runtime)
        .env("RUST_LOG", "warn")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;

    let lock = runtime.join("autounpack").join("autounpack.lock");
    assert!(wait_until(|| lock.exists()), "instance lock never appeared");
    // Watchers subscribe right after the lock is taken
    std::thread::sleep(Duration::from_secs(1));

    let archive = watched.join("movie.zip");
    std::fs::write(&archive, b"PK\x03\x04")?;
    let consumed = wait_until(|| !archive.exists());

    kill(Pid::from_raw(child.id() as i32), Signal::SIGTERM)?;
    let status = child.wait()?;

    assert!(consumed, "archive was not consumed");
    assert!(status.success(), "exit status: {status}");
    assert!(!lock.exists());
    Ok(())
}
