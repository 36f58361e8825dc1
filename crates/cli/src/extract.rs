//! Extraction policy for settled files
//!
//! Runs the configured 7-Zip compatible program on archives whose name
//! ends with a configured suffix. Failures are logged, never returned to
//! the watcher.

use crate::system_config::SystemConfig;
use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tracing::{debug, error, info, trace};
use watcher::{SettleHandler, SettledFile};

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} exited with {status} while unpacking {}", .archive.display())]
    Failed {
        program: String,
        status: ExitStatus,
        archive: PathBuf,
    },

    #[error("unpacked {} but could not delete it: {source}", .archive.display())]
    Delete {
        archive: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Settle handler that unpacks matching archives
#[derive(Debug)]
pub struct ArchiveExtractor {
    zip_exe: String,
    extensions: Vec<String>,
    delete_after: bool,
    enabled: AtomicBool,
}

impl ArchiveExtractor {
    pub fn new(zip_exe: impl Into<String>, extensions: Vec<String>, delete_after: bool) -> Self {
        Self {
            zip_exe: zip_exe.into(),
            extensions,
            delete_after,
            enabled: AtomicBool::new(true),
        }
    }

    pub fn from_config(config: &SystemConfig) -> Self {
        Self::new(
            config.settings.zip_exe.clone(),
            config.extensions(),
            config.settings.delete_after,
        )
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    /// Flip the enabled state, returning the new one
    pub fn toggle(&self) -> bool {
        !self.enabled.fetch_xor(true, Ordering::Relaxed)
    }

    /// The configured suffix `file_name` ends with, if any
    pub fn matching_extension(&self, file_name: &OsStr) -> Option<&str> {
        let name = file_name.to_str()?;
        self.extensions
            .iter()
            .find(|ext| name.len() >= ext.len() && name.ends_with(ext.as_str()))
            .map(String::as_str)
    }

    /// `<zip_exe> x <archive> -spe -y -o*`, run from the archive's folder
    ///
    /// `-o*` extracts into a directory named after the archive; `-spe`
    /// avoids doubling that directory when the archive has a single root.
    pub fn command(&self, directory: &Path, archive: &Path) -> Command {
        let mut command = Command::new(&self.zip_exe);
        command
            .arg("x")
            .arg(archive)
            .args(["-spe", "-y", "-o*"])
            .current_dir(directory)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        command
    }

    /// Unpack `file` and wait for the program to finish
    pub fn extract(&self, file: &SettledFile) -> Result<(), ExtractError> {
        debug!(archive = %file.full_path.display(), program = %self.zip_exe, "running extractor");

        let status = self
            .command(&file.directory, &file.full_path)
            .status()
            .map_err(|source| ExtractError::Spawn {
                program: self.zip_exe.clone(),
                source,
            })?;

        if !status.success() {
            return Err(ExtractError::Failed {
                program: self.zip_exe.clone(),
                status,
                archive: file.full_path.clone(),
            });
        }

        if self.delete_after {
            std::fs::remove_file(&file.full_path).map_err(|source| ExtractError::Delete {
                archive: file.full_path.clone(),
                source,
            })?;
        }

        Ok(())
    }
}

impl SettleHandler for ArchiveExtractor {
    fn on_file_settled(&self, file: &SettledFile) {
        if !self.is_enabled() {
            debug!(path = %file.full_path.display(), "extraction disabled; skipping");
            return;
        }

        let Some(extension) = self.matching_extension(&file.file_name) else {
            trace!(path = %file.full_path.display(), "not an archive");
            return;
        };

        match self.extract(file) {
            Ok(()) => info!(
                archive = %file.full_path.display(),
                extension,
                deleted = self.delete_after,
                "unpacked archive"
            ),
            Err(e) => error!(archive = %file.full_path.display(), "Failed to unpack archive: {}", e),
        }
    }
}
