//! Error types for the sync engine.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::checksum::Validation;
use crate::net::NetError;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur while synchronizing an installation.
///
/// Only [`SyncError::Cancelled`] and patch list failures end an operation;
/// the per-file variants are collected into reports instead of propagating.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The user asked the running operation to stop.
    #[error("operation cancelled")]
    Cancelled,

    /// Transport-level failure (DNS, TLS, connection, timeout, read).
    #[error("network error for {url}: {reason}")]
    Network { url: String, reason: String },

    /// Server answered with a non-200 status.
    #[error("HTTP {code} {reason} from {url}")]
    Status {
        url: String,
        code: u16,
        reason: String,
    },

    /// Downloaded file does not match its patch list entry.
    #[error("validation failed for {path}: {outcome}")]
    Validation { path: String, outcome: Validation },

    /// Patch list path resolves outside the installation root.
    #[error("directory traversal blocked: {path}")]
    PathSafety { path: String },

    /// OS-level read, write, rename or delete failure.
    #[error("filesystem error on {}: {source}", path.display())]
    Filesystem { path: PathBuf, source: io::Error },

    /// Anything else; logged with full detail.
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl SyncError {
    /// Whether this is the cancellation signal rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SyncError::Cancelled)
    }

    /// Whether another attempt at the same file could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SyncError::Network { .. }
                | SyncError::Status { .. }
                | SyncError::Validation { .. }
                | SyncError::Filesystem { .. }
        )
    }

    pub(crate) fn filesystem(path: impl Into<PathBuf>, source: io::Error) -> Self {
        SyncError::Filesystem {
            path: path.into(),
            source,
        }
    }
}

impl From<NetError> for SyncError {
    fn from(e: NetError) -> Self {
        match e {
            NetError::Status { url, code, reason } => SyncError::Status { url, code, reason },
            NetError::Transport { url, reason } => SyncError::Network { url, reason },
            other => SyncError::Unexpected(other.to_string()),
        }
    }
}
