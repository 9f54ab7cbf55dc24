//! LOCPatcher CLI - Command-line interface
//!
//! Keeps a Last Oasis Classic installation in sync with the remote patch list.

mod commands;
mod error;
mod progress;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use locpatcher::config::{log_directory, LOG_FILE_NAME};
use locpatcher::logging;

use commands::config::ConfigCommands;
use error::CliError;

#[derive(Parser)]
#[command(name = "locpatcher")]
#[command(version, about = "Keep a Last Oasis Classic installation up to date", long_about = None)]
struct Cli {
    /// Game directory (overrides the configured one)
    #[arg(long, global = true, value_name = "PATH")]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the patch list and report missing or outdated files
    Check,

    /// Check, then download every missing or outdated file
    Patch,

    /// Delete every file the patcher has ever tracked
    Clear {
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },

    /// View or edit the configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        e.exit();
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let _logging_guard = logging::init_logging(&log_directory(), LOG_FILE_NAME)
        .map_err(|e| CliError::LoggingInit(e.to_string()))?;

    tracing::info!(version = locpatcher::VERSION, "LOCPatcher starting");

    let dir = cli.dir.as_deref();
    match cli.command {
        Commands::Check => commands::check::run(dir),
        Commands::Patch => commands::patch::run(dir),
        Commands::Clear { yes } => commands::clear::run(dir, yes),
        Commands::Config { command } => commands::config::run(command),
    }
}
