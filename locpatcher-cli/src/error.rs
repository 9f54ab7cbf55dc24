//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::path::PathBuf;
use std::process;

use locpatcher::config::ConfigFileError;
use locpatcher::sync::SyncError;

/// Exit code for an operation stopped with Ctrl+C.
pub const EXIT_CANCELLED: i32 = 130;

/// Exit code when a patch left some files outdated.
pub const EXIT_PARTIAL: i32 = 2;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Config file could not be read or written
    ConfigFile(ConfigFileError),
    /// Tracked-file list could not be read or written
    TrackedFiles { path: PathBuf, error: std::io::Error },
    /// Sync operation failed
    Sync(SyncError),
    /// Worker thread died
    Worker(String),
    /// Some files could not be downloaded
    PartialFailure { failed: usize },
    /// Stopped on user request
    Cancelled,
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Cancelled => EXIT_CANCELLED,
            CliError::PartialFailure { .. } => EXIT_PARTIAL,
            _ => 1,
        }
    }

    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Config(_) => {
                eprintln!();
                eprintln!("Set the game directory with:");
                eprintln!("  locpatcher config set-dir <path>");
                eprintln!("or pass --dir <path> to any command.");
            }
            CliError::Sync(SyncError::Network { .. }) | CliError::Sync(SyncError::Status { .. }) => {
                eprintln!();
                eprintln!("The patch server could not be reached. Check your connection");
                eprintln!("and try again; details are in the log file.");
            }
            CliError::PartialFailure { .. } => {
                eprintln!();
                eprintln!("Run `locpatcher patch` again to retry the remaining files.");
            }
            _ => {}
        }

        process::exit(self.exit_code())
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::ConfigFile(e) => write!(f, "{}", e),
            CliError::TrackedFiles { path, error } => write!(
                f,
                "Failed to access tracked-file list '{}': {}",
                path.display(),
                error
            ),
            CliError::Sync(e) => write!(f, "{}", e),
            CliError::Worker(msg) => write!(f, "Worker thread failed: {}", msg),
            CliError::PartialFailure { failed } => {
                write!(f, "{} file(s) could not be downloaded", failed)
            }
            CliError::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::ConfigFile(e) => Some(e),
            CliError::TrackedFiles { error, .. } => Some(error),
            CliError::Sync(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::ConfigFile(e)
    }
}

impl From<SyncError> for CliError {
    fn from(e: SyncError) -> Self {
        match e {
            SyncError::Cancelled => CliError::Cancelled,
            other => CliError::Sync(other),
        }
    }
}
