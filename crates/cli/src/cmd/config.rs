//! Configuration management command
//!
//! View and edit `settings.toml` from the command line.

use anyhow::{Context, Result};
use cli_lib::system_config::{self, MAX_DELIM_ENTRIES};
use owo_colors::OwoColorize;
use std::path::Path;

/// List all configuration values
pub fn run_list(config_path: &Path) -> Result<()> {
    let config = system_config::load_from(config_path)?;
    let s = &config.settings;

    println!("{}", "AutoUnpack Configuration".bold());
    println!("{}: {}\n", "Location".dimmed(), config_path.display().dimmed());

    println!("{}", "[settings]".yellow());
    println!("  {} = {}", "folders".cyan(), s.folders);
    for folder in config.folders() {
        let state = if folder.is_dir() {
            "(ok)".green().to_string()
        } else {
            "(missing)".red().to_string()
        };
        println!("      {} {}", folder.display().dimmed(), state);
    }
    println!("  {} = {}", "extensions".cyan(), s.extensions);
    println!(
        "  {} = {} {}",
        "wait_time_ms".cyan(),
        s.wait_time_ms,
        format!("({:.1}s)", s.wait_time_ms as f64 / 1000.0).dimmed()
    );
    println!("  {} = {}", "max_file_size_mb".cyan(), s.max_file_size_mb);
    println!("  {} = {}", "zip_exe".cyan(), s.zip_exe);
    println!("  {} = {}", "delete_after".cyan(), s.delete_after);

    println!("\n{}", "Valid Ranges:".bold());
    println!("  folders, extensions: comma-separated, at most {} entries", MAX_DELIM_ENTRIES);
    println!("  wait_time_ms: 0-3,600,000");
    println!("  max_file_size_mb: 1-1,000,000");

    Ok(())
}

/// Get a single configuration value
pub fn run_get(config_path: &Path, key: &str) -> Result<()> {
    let config = system_config::load_from(config_path)?;
    let s = &config.settings;

    let value = match key {
        "folders" => s.folders.clone(),
        "extensions" => s.extensions.clone(),
        "wait_time_ms" => s.wait_time_ms.to_string(),
        "max_file_size_mb" => s.max_file_size_mb.to_string(),
        "zip_exe" => s.zip_exe.clone(),
        "delete_after" => s.delete_after.to_string(),
        _ => anyhow::bail!(
            "Unknown config key: {}. Use 'autounpack config list' to see available keys.",
            key
        ),
    };

    println!("{}", value);
    Ok(())
}

/// Set a configuration value
pub fn run_set(config_path: &Path, key: &str, value: &str) -> Result<()> {
    let mut config = system_config::load_from(config_path)?;
    let s = &mut config.settings;

    match key {
        "folders" => s.folders = value.to_string(),
        "extensions" => s.extensions = value.to_string(),
        "wait_time_ms" => {
            s.wait_time_ms = value
                .parse()
                .context("Invalid value: must be a non-negative integer")?;
        }
        "max_file_size_mb" => {
            s.max_file_size_mb = value
                .parse()
                .context("Invalid value: must be a positive integer")?;
        }
        "zip_exe" => s.zip_exe = value.to_string(),
        "delete_after" => {
            s.delete_after = value
                .parse()
                .context("Invalid value: must be 'true' or 'false'")?;
        }
        _ => anyhow::bail!(
            "Unknown config key: {}. Use 'autounpack config list' to see available keys.",
            key
        ),
    }

    config.validate().context("Invalid configuration value")?;
    system_config::save_to(&config, config_path)?;

    println!("{} {} = {}", "✓".green(), key.cyan(), value);
    println!(
        "{}",
        "Note: Restart AutoUnpack for changes to take effect".yellow()
    );

    Ok(())
}

/// Show the config file path and optionally create it
pub fn run_path(config_path: &Path, create: bool) -> Result<()> {
    if create && system_config::init_if_missing(config_path)? {
        println!("{} Created config file at: {}", "✓".green(), config_path.display());
    } else if config_path.exists() {
        println!("{}", config_path.display());
    } else {
        println!("{}", config_path.display());
        println!("{}", "File does not exist. Use --create to create it.".yellow());
    }

    Ok(())
}

/// Show example configuration
pub fn run_example() -> Result<()> {
    println!("{}", system_config::example_config());
    Ok(())
}
