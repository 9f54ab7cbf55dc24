//! Outcome summaries for download and clear operations.

use super::error::SyncError;

/// A file that could not be downloaded.
#[derive(Debug)]
pub struct FileFailure {
    /// Patch list path.
    pub path: String,
    /// Error from the last attempt.
    pub error: SyncError,
}

/// Result of [`SyncSession::download_outdated`](super::SyncSession::download_outdated).
#[derive(Debug, Default)]
pub struct DownloadReport {
    /// Paths downloaded, verified and moved into place, in processing order.
    pub downloaded: Vec<String>,
    /// Paths that exhausted their attempts or were blocked.
    pub failed: Vec<FileFailure>,
    /// Bytes written for the downloaded files.
    pub bytes_downloaded: u64,
}

impl DownloadReport {
    /// Whether every outdated file was brought up to date.
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }

    /// Paths of the failed files.
    pub fn failed_paths(&self) -> Vec<String> {
        self.failed.iter().map(|f| f.path.clone()).collect()
    }
}

/// Result of [`SyncSession::clear_tracked_files`](super::SyncSession::clear_tracked_files).
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ClearReport {
    /// Files that existed and were deleted.
    pub deleted: usize,
    /// Files that were already absent.
    pub missed: usize,
    /// Unsafe paths and OS delete failures.
    pub errored: usize,
    /// Deleted and missed paths, safe to drop from the tracked-file list.
    pub reconciled: Vec<String>,
}

impl ClearReport {
    /// `(deleted, missed, errored)`.
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.deleted, self.missed, self.errored)
    }
}
