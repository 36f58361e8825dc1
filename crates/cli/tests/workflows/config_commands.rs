//! `autounpack config ...` against a throwaway config file

use crate::autounpack;
use anyhow::Result;
use cli_lib::system_config;
use tempfile::TempDir;

#[test]
fn test_example_parses_to_defaults() -> Result<()> {
    let temp = TempDir::new()?;
    let config_path = temp.path().join("settings.toml");

    let result = autounpack!(&config_path, "config", "example").assert_success()?;
    assert!(result.contains_stdout("[settings]"));

    let parsed: cli_lib::SystemConfig = toml::from_str(&result.stdout)?;
    assert_eq!(parsed, cli_lib::SystemConfig::default());
    Ok(())
}

#[test]
fn test_path_create_writes_file_once() -> Result<()> {
    let temp = TempDir::new()?;
    let config_path = temp.path().join("nested").join("settings.toml");

    let result = autounpack!(&config_path, "config", "path").assert_success()?;
    assert!(result.contains_stdout("does not exist"));
    assert!(!config_path.exists());

    let result = autounpack!(&config_path, "config", "path", "--create").assert_success()?;
    assert!(result.contains_stdout("Created config file"));
    assert!(config_path.exists());

    // Existing file is left alone
    std::fs::write(&config_path, "[settings]\nwait_time_ms = 42\n")?;
    let result = autounpack!(&config_path, "config", "path", "--create").assert_success()?;
    assert!(!result.contains_stdout("Created config file"));
    assert_eq!(system_config::load_from(&config_path)?.settings.wait_time_ms, 42);
    Ok(())
}

#[test]
fn test_set_then_get() -> Result<()> {
    let temp = TempDir::new()?;
    let config_path = temp.path().join("settings.toml");

    autounpack!(&config_path, "config", "set", "wait_time_ms", "2500").assert_success()?;
    autounpack!(&config_path, "config", "set", "delete_after", "true").assert_success()?;
    autounpack!(&config_path, "config", "set", "extensions", ".zip,.rar").assert_success()?;

    let result = autounpack!(&config_path, "config", "get", "wait_time_ms").assert_success()?;
    assert_eq!(result.stdout.trim(), "2500");
    let result = autounpack!(&config_path, "config", "get", "extensions").assert_success()?;
    assert_eq!(result.stdout.trim(), ".zip,.rar");

    let saved = system_config::load_from(&config_path)?;
    assert!(saved.settings.delete_after);
    assert_eq!(saved.settings.zip_exe, "7z");
    Ok(())
}

#[test]
fn test_set_rejects_out_of_range_values() -> Result<()> {
    let temp = TempDir::new()?;
    let config_path = temp.path().join("settings.toml");

    let result =
        autounpack!(&config_path, "config", "set", "wait_time_ms", "3600001").assert_failure()?;
    assert!(result.contains_stderr("wait_time_ms"));
    autounpack!(&config_path, "config", "set", "max_file_size_mb", "0").assert_failure()?;
    autounpack!(&config_path, "config", "set", "delete_after", "maybe").assert_failure()?;

    // Nothing was written
    assert!(!config_path.exists());
    Ok(())
}

#[test]
fn test_unknown_key() -> Result<()> {
    let temp = TempDir::new()?;
    let config_path = temp.path().join("settings.toml");

    let result = autounpack!(&config_path, "config", "get", "colour").assert_failure()?;
    assert!(result.contains_stderr("Unknown config key"));
    autounpack!(&config_path, "config", "set", "colour", "blue").assert_failure()?;
    Ok(())
}

#[test]
fn test_list_shows_folder_state() -> Result<()> {
    let temp = TempDir::new()?;
    let config_path = temp.path().join("settings.toml");
    let present = temp.path().join("present");
    std::fs::create_dir(&present)?;
    let missing = temp.path().join("missing");

    let folders = format!("{},{}", present.display(), missing.display());
    autounpack!(&config_path, "config", "set", "folders", &folders).assert_success()?;

    let result = autounpack!(&config_path, "config", "list").assert_success()?;
    assert!(result.contains_stdout("wait_time_ms"));
    assert!(result.contains_stdout("(ok)"));
    assert!(result.contains_stdout("(missing)"));
    Ok(())
}
