//! AutoUnpack CLI - autounpack command

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

mod cmd;

/// AutoUnpack - extract archives as soon as they finish downloading
#[derive(Parser)]
#[command(name = "autounpack")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (default: platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Also write a daily-rotated log file into this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch the configured folders (default)
    Run,
    /// View or edit the configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// List all configuration values
    List,
    /// Print a single value
    Get {
        /// Key, e.g. wait_time_ms
        key: String,
    },
    /// Set a single value
    Set {
        /// Key, e.g. wait_time_ms
        key: String,
        /// New value
        value: String,
    },
    /// Show the configuration file path
    Path {
        /// Create the file with defaults if it does not exist
        #[arg(long)]
        create: bool,
    },
    /// Print an example configuration
    Example,
}

fn init_tracing(log_dir: Option<&PathBuf>) -> Option<WorkerGuard> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr_layer = fmt::layer().with_writer(std::io::stderr);

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "autounpack.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .init();
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_tracing(cli.log_dir.as_ref());

    let config_path = match cli.config {
        Some(path) => path,
        None => cli_lib::system_config::config_file_path()
            .context("Could not determine config file path")?,
    };

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => cmd::run::run(&config_path).await,
        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::List => cmd::config::run_list(&config_path),
            ConfigCommands::Get { key } => cmd::config::run_get(&config_path, &key),
            ConfigCommands::Set { key, value } => cmd::config::run_set(&config_path, &key, &value),
            ConfigCommands::Path { create } => cmd::config::run_path(&config_path, create),
            ConfigCommands::Example => cmd::config::run_example(),
        },
    }
}
