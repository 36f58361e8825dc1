//! User configuration (`settings.toml`)
//!
//! Lives in the platform config directory (`~/.config/autounpack` on
//! Linux). A missing file means defaults. Folder and extension lists are
//! comma-separated strings capped at [`MAX_DELIM_ENTRIES`] entries.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;
use watcher::WatchConfig;

/// Maximum number of entries read from a delimited list
pub const MAX_DELIM_ENTRIES: usize = 8;

/// Separator for `folders` and `extensions`
pub const DELIMITER: char = ',';

const APP_DIR: &str = "autounpack";
const CONFIG_FILE: &str = "settings.toml";

/// Top-level configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub settings: Settings,
}

/// `[settings]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directories to watch
    pub folders: String,
    /// File name suffixes that trigger extraction
    pub extensions: String,
    /// Idle time before a file counts as complete
    pub wait_time_ms: u64,
    /// Larger files are never extracted
    pub max_file_size_mb: u64,
    /// Extraction program (7-Zip compatible command line)
    pub zip_exe: String,
    /// Delete the archive after a successful extraction
    pub delete_after: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            folders: "~/Downloads".to_string(),
            extensions: ".zip,.7z".to_string(),
            wait_time_ms: 1000,
            max_file_size_mb: 250,
            zip_exe: "7z".to_string(),
            delete_after: false,
        }
    }
}

impl SystemConfig {
    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        let s = &self.settings;

        if s.wait_time_ms > 3_600_000 {
            anyhow::bail!("wait_time_ms must be between 0 and 3600000 (got {})", s.wait_time_ms);
        }
        if !(1..=1_000_000).contains(&s.max_file_size_mb) {
            anyhow::bail!(
                "max_file_size_mb must be between 1 and 1000000 (got {})",
                s.max_file_size_mb
            );
        }
        if s.zip_exe.trim().is_empty() {
            anyhow::bail!("zip_exe must not be empty");
        }
        if self.folders().is_empty() {
            anyhow::bail!("folders must list at least one directory");
        }
        if self.extensions().is_empty() {
            anyhow::bail!("extensions must list at least one suffix");
        }

        Ok(())
    }

    /// Configured folders with `~` and `%userprofile%` expanded
    pub fn folders(&self) -> Vec<PathBuf> {
        split_list(&self.settings.folders)
            .into_iter()
            .map(expand_home)
            .collect()
    }

    /// Configured extensions, as written (case-sensitive suffixes)
    pub fn extensions(&self) -> Vec<String> {
        split_list(&self.settings.extensions)
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.settings.wait_time_ms)
    }

    /// One watcher configuration per folder
    pub fn watch_configs(&self) -> Vec<WatchConfig> {
        self.folders()
            .into_iter()
            .map(|folder| {
                WatchConfig::new(folder)
                    .with_idle_timeout(self.idle_timeout())
                    .with_max_file_size_mb(self.settings.max_file_size_mb)
            })
            .collect()
    }
}

/// Split a delimited list, dropping blanks and anything past the cap
pub fn split_list(raw: &str) -> Vec<&str> {
    let entries: Vec<&str> = raw
        .split(DELIMITER)
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .collect();

    if entries.len() > MAX_DELIM_ENTRIES {
        warn!(
            "Only the first {} of {} entries are used: {:?}",
            MAX_DELIM_ENTRIES,
            entries.len(),
            &entries[MAX_DELIM_ENTRIES..]
        );
    }

    entries.into_iter().take(MAX_DELIM_ENTRIES).collect()
}

/// Expand a leading `~` or `%userprofile%` to the home directory
pub fn expand_home(raw: &str) -> PathBuf {
    let Some(home) = dirs::home_dir() else {
        return PathBuf::from(raw);
    };

    for prefix in ["~", "%userprofile%", "%USERPROFILE%"] {
        if let Some(rest) = raw.strip_prefix(prefix) {
            let rest = rest.trim_start_matches(['/', '\\']);
            if rest.is_empty() {
                return home;
            }
            // Only a whole leading component counts ("~user" is left alone)
            if raw.len() - rest.len() > prefix.len() {
                return home.join(rest);
            }
        }
    }

    PathBuf::from(raw)
}

/// Default location of the configuration file
pub fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}

/// Directory for the single-instance lock
pub fn runtime_dir() -> Result<PathBuf> {
    dirs::runtime_dir()
        .or_else(dirs::cache_dir)
        .map(|dir| dir.join(APP_DIR))
        .context("Could not determine a runtime directory")
}

/// Load from the default location
pub fn load() -> Result<SystemConfig> {
    let path = config_file_path().context("Could not determine config file path")?;
    load_from(&path)
}

/// Load from `path`; a missing file yields defaults
pub fn load_from(path: &Path) -> Result<SystemConfig> {
    if !path.exists() {
        return Ok(SystemConfig::default());
    }

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: SystemConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;

    Ok(config)
}

/// Save to the default location
pub fn save(config: &SystemConfig) -> Result<()> {
    let path = config_file_path().context("Could not determine config file path")?;
    save_to(config, &path)
}

pub fn save_to(config: &SystemConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    let contents = toml::to_string_pretty(config).context("Failed to serialize config")?;
    std::fs::write(path, contents)
        .with_context(|| format!("Failed to write config file {}", path.display()))?;
    Ok(())
}

/// Write the default configuration if no file exists yet
///
/// Returns true if a file was created.
pub fn init_if_missing(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    std::fs::create_dir_all(path.parent().unwrap_or(Path::new(".")))
        .context("Failed to create config directory")?;
    std::fs::write(path, example_config())
        .with_context(|| format!("Failed to write config file {}", path.display()))?;
    Ok(true)
}

/// Commented default configuration
pub fn example_config() -> String {
    let d = Settings::default();
    format!(
        r#"# AutoUnpack configuration

[settings]
# Folders to watch, comma-separated (at most {max}); ~ expands to your home directory
folders = "{folders}"

# Archive suffixes to extract, comma-separated (at most {max})
extensions = "{extensions}"

# How long a file must stay unchanged before it is extracted
wait_time_ms = {wait}

# Files larger than this are left alone (1 MB = 1,000,000 bytes)
max_file_size_mb = {size}

# Extraction program, invoked as: <zip_exe> x "<archive>" -spe -y -o*
zip_exe = "{zip}"

# Delete the archive after a successful extraction
delete_after = {delete}
"#,
        max = MAX_DELIM_ENTRIES,
        folders = d.folders,
        extensions = d.extensions,
        wait = d.wait_time_ms,
        size = d.max_file_size_mb,
        zip = d.zip_exe,
        delete = d.delete_after,
    )
}
