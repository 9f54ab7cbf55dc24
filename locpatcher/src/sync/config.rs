//! Configuration for a sync session.

use std::path::PathBuf;
use std::time::Duration;

use super::retry::RetryPolicy;
use crate::speed::DEFAULT_UPDATE_INTERVAL;

/// Remote patch list location.
pub const DEFAULT_MANIFEST_URL: &str = "https://loc.iambvc.it/client/patchlist.txt";

/// Base URL that patch list paths are appended to.
pub const DEFAULT_REMOTE_HOST: &str = "https://loc.iambvc.it/client/";

/// Read buffer for streamed downloads (128KB).
pub const DEFAULT_CHUNK_SIZE: usize = 128 * 1024;

/// Configuration for a [`SyncSession`](super::SyncSession).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Installation root every patch list path is placed under.
    pub install_root: PathBuf,

    /// URL of the patch list.
    pub manifest_url: String,

    /// Base URL for file bodies; the patch list path is appended verbatim.
    pub remote_host: String,

    /// Per-file retry behaviour.
    pub retry: RetryPolicy,

    /// Read buffer size for streamed downloads.
    pub chunk_size: usize,

    /// Minimum time between download progress events.
    pub progress_interval: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            install_root: PathBuf::from("."),
            manifest_url: DEFAULT_MANIFEST_URL.to_string(),
            remote_host: DEFAULT_REMOTE_HOST.to_string(),
            retry: RetryPolicy::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            progress_interval: DEFAULT_UPDATE_INTERVAL,
        }
    }
}

impl SyncConfig {
    /// Create a configuration for the given installation root.
    pub fn new(install_root: impl Into<PathBuf>) -> Self {
        Self {
            install_root: install_root.into(),
            ..Default::default()
        }
    }

    /// Set the patch list URL.
    pub fn with_manifest_url(mut self, url: impl Into<String>) -> Self {
        self.manifest_url = url.into();
        self
    }

    /// Set the file body base URL.
    pub fn with_remote_host(mut self, url: impl Into<String>) -> Self {
        self.remote_host = url.into();
        self
    }

    /// Set the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set the download read buffer size (minimum 1 byte).
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Set the minimum time between download progress events.
    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Download URL for a patch list path.
    pub fn file_url(&self, path: &str) -> String {
        format!("{}{}", self.remote_host, path)
    }
}
