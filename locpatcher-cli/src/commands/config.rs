//! Configuration management CLI commands.
//!
//! Provides `config show`, `config set-dir` and `config path`.

use std::path::PathBuf;

use clap::Subcommand;
use locpatcher::config::{config_file_path, tracked_files_path, ConfigFile};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show the current configuration
    Show,

    /// Set the game installation directory
    SetDir {
        /// Directory containing the game files
        path: PathBuf,
    },

    /// Show the configuration file path
    Path,
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Show => run_show(),
        ConfigCommands::SetDir { path } => run_set_dir(path),
        ConfigCommands::Path => run_path(),
    }
}

fn run_show() -> Result<(), CliError> {
    let config = ConfigFile::load()?;
    let working_dir = config
        .patcher
        .working_dir
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(not set)".to_string());

    println!("[patcher]");
    println!("working_dir     = {}", working_dir);
    println!("manifest_url    = {}", config.patcher.manifest_url);
    println!("remote_host     = {}", config.patcher.remote_host);
    println!();
    println!("[network]");
    println!("timeout_secs    = {}", config.network.timeout_secs);
    println!("user_agent      = {}", config.network.user_agent);
    println!();
    println!("[retry]");
    println!("max_attempts    = {}", config.retry.max_attempts);
    println!("base_delay_secs = {}", config.retry.base_delay_secs);

    Ok(())
}

fn run_set_dir(path: PathBuf) -> Result<(), CliError> {
    if !path.is_dir() {
        return Err(CliError::Config(format!(
            "'{}' is not a directory",
            path.display()
        )));
    }
    let path = path.canonicalize().unwrap_or(path);

    let mut config = ConfigFile::load()?;
    config.patcher.working_dir = Some(path.clone());
    config.save()?;

    tracing::info!(dir = %path.display(), "Game directory updated");
    println!("Game directory set to {}", path.display());
    Ok(())
}

fn run_path() -> Result<(), CliError> {
    println!("{}", config_file_path().display());
    println!("{}", tracked_files_path().display());
    Ok(())
}
