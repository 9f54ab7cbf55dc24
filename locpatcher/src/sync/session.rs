//! The sync session: patch list fetch, local check, download and clear.

use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;

use super::cancel::CancelToken;
use super::config::SyncConfig;
use super::error::{SyncError, SyncResult};
use super::events::{EventSink, Severity, SyncEvent};
use super::report::{ClearReport, DownloadReport, FileFailure};
use super::state::SyncState;
use crate::checksum::{self, Validation};
use crate::format::{format_eta, format_rate, format_size, percent};
use crate::manifest::{file_name, Manifest, ManifestEntry};
use crate::net::Transport;
use crate::safety;
use crate::speed::{eta_seconds, SpeedTracker};

/// Phase count shown on the action bar during a check.
const CHECK_PHASES: u64 = 3;

/// Aggregate byte counters for one `download_outdated` call.
struct DownloadProgress {
    total_files: usize,
    file_index: usize,
    total_bytes: u64,
    completed_bytes: u64,
    overall: SpeedTracker,
}

/// State of one logical operation against an installation.
///
/// A session owns the fetched patch list and the outdated set. It is meant to
/// run on one worker thread; the only thing shared with other threads is the
/// [`CancelToken`] (see [`SyncSession::cancel_token`]) and the event sink.
///
/// Operations return `Err(SyncError::Cancelled)` when the token fires at a
/// checkpoint. Files already moved into place stay there; a partially
/// streamed temporary file is removed.
pub struct SyncSession<T: Transport> {
    config: SyncConfig,
    transport: T,
    events: Box<dyn EventSink>,
    cancel: CancelToken,
    manifest: Manifest,
    outdated: Vec<String>,
    state: SyncState,
}

impl<T: Transport> SyncSession<T> {
    /// Create a session.
    pub fn new(config: SyncConfig, transport: T, events: impl EventSink + 'static) -> Self {
        Self {
            config,
            transport,
            events: Box::new(events),
            cancel: CancelToken::new(),
            manifest: Manifest::new(),
            outdated: Vec::new(),
            state: SyncState::Idle,
        }
    }

    /// Use an existing cancellation token (e.g. one wired to Ctrl+C).
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that cancels this session from any thread.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Request cancellation of the running operation.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SyncState {
        self.state
    }

    /// Session configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Patch list from the last successful fetch.
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Paths missing locally or failing validation, in patch list order.
    pub fn outdated(&self) -> &[String] {
        &self.outdated
    }

    /// Fetch the patch list, then scan and validate local files.
    ///
    /// Returns the number of outdated files.
    pub fn check_for_updates(&mut self) -> SyncResult<usize> {
        self.fetch_manifest()?;
        self.check_local_files()
    }

    /// Fetch and parse the remote patch list.
    ///
    /// On success the manifest is replaced, `ManifestReady` is emitted once
    /// and the number of tracked files is returned. On failure the previous
    /// manifest is kept and the session moves to [`SyncState::Failed`].
    pub fn fetch_manifest(&mut self) -> SyncResult<usize> {
        let result = self.fetch_manifest_inner();
        self.settle(result)
    }

    fn fetch_manifest_inner(&mut self) -> SyncResult<usize> {
        self.cancel.check()?;
        self.state = SyncState::Fetching;

        let url = self.config.manifest_url.clone();
        self.status(
            format!("Fetching patch list from {}", short_url(&url)),
            Severity::Info,
        );
        self.action(0, CHECK_PHASES, "Step 1/3 - Fetching patch list");
        tracing::info!(url = %url, "Fetching patch list");

        let content = match self.transport.fetch_text(&url) {
            Ok(content) => content,
            Err(e) => {
                let err = SyncError::from(e);
                self.report_fetch_failure(&err);
                self.state = SyncState::Failed;
                return Err(err);
            }
        };

        self.cancel.check()?;

        let manifest = Manifest::parse(&content);
        let count = manifest.len();
        if manifest.rejected() > 0 {
            tracing::warn!(
                rejected = manifest.rejected(),
                "Patch list contained malformed lines"
            );
        }
        self.manifest = manifest;

        tracing::info!(files = count, "Patch list loaded");
        self.status(
            format!("Patch list OK - {} files tracked", count),
            Severity::Success,
        );
        self.action(1, CHECK_PHASES, "Step 1/3 - Patch list fetched");
        self.events
            .emit(SyncEvent::ManifestReady(self.manifest.paths()));
        self.state = SyncState::Fetched;

        Ok(count)
    }

    fn report_fetch_failure(&self, err: &SyncError) {
        match err {
            SyncError::Status { url, code, reason } => {
                tracing::warn!(url = %url, code, "Patch list request failed: {}", reason);
                self.status(format!("ERROR: HTTP {} - {}", code, reason), Severity::Error);
            }
            SyncError::Network { url, reason } => {
                tracing::warn!(url = %url, "Network error fetching patch list: {}", reason);
                self.status(format!("ERROR: Network - {}", reason), Severity::Error);
            }
            other => {
                tracing::error!(error = ?other, "Unexpected error fetching patch list");
                self.status(format!("ERROR: {}", other), Severity::Error);
            }
        }
    }

    /// Scan for missing files, then validate the ones present.
    ///
    /// Rebuilds the outdated set from scratch and returns its size.
    pub fn check_local_files(&mut self) -> SyncResult<usize> {
        let result = self
            .scan_local()
            .and_then(|candidates| self.validate_candidates(&candidates));
        self.settle(result)
    }

    /// Record missing files as outdated and return the paths that exist.
    ///
    /// Clears the outdated set first. A cancellation leaves it partially
    /// built; discard the session in that case.
    pub fn scan_local(&mut self) -> SyncResult<Vec<String>> {
        let result = self.scan_local_inner();
        self.settle(result)
    }

    fn scan_local_inner(&mut self) -> SyncResult<Vec<String>> {
        self.cancel.check()?;
        self.state = SyncState::Scanning;
        self.outdated.clear();

        let total = self.manifest.len() as u64;
        let root = self.config.install_root.clone();
        self.status("Checking local files...", Severity::Info);
        self.action(1, CHECK_PHASES, "Step 2/3 - Checking local files");
        tracing::info!(files = total, root = %root.display(), "Scanning local files");

        let mut candidates = Vec::new();
        for (i, entry) in self.manifest.entries().enumerate() {
            self.cancel.check()?;

            let idx = i as u64 + 1;
            self.step(
                idx,
                total,
                format!("Scanning {}/{}: {}", idx, total, entry.file_name()),
            );

            match safety::resolve_within(&root, &entry.path) {
                Some(local) if local.is_file() => candidates.push(entry.path.clone()),
                Some(_) => {
                    tracing::debug!(path = %entry.path, "Missing");
                    self.outdated.push(entry.path.clone());
                }
                None => {
                    // Left for the download step to reject with a clear error.
                    tracing::warn!(path = %entry.path, "Patch list path escapes install root");
                    self.outdated.push(entry.path.clone());
                }
            }
        }

        self.action(2, CHECK_PHASES, "Step 2/3 - Local scan complete");
        Ok(candidates)
    }

    /// Size- then CRC-check `candidates`, adding failures to the outdated set.
    ///
    /// Files that cannot be read count as outdated. Returns the size of the
    /// outdated set; the session ends in [`SyncState::UpToDate`] or
    /// [`SyncState::NeedsDownload`].
    pub fn validate_candidates(&mut self, candidates: &[String]) -> SyncResult<usize> {
        let result = self.validate_candidates_inner(candidates);
        self.settle(result)
    }

    fn validate_candidates_inner(&mut self, candidates: &[String]) -> SyncResult<usize> {
        self.cancel.check()?;
        self.state = SyncState::Validating;

        let total = candidates.len() as u64;
        self.status("Validating local files (CRC)...", Severity::Info);
        self.action(2, CHECK_PHASES, "Step 3/3 - Validating checksums");
        tracing::info!(files = total, "Validating existing files");

        for (i, path) in candidates.iter().enumerate() {
            self.cancel.check()?;

            let idx = i as u64 + 1;
            self.step(
                idx,
                total,
                format!("Validating {}/{}: {}", idx, total, file_name(path)),
            );

            match self.validate_local(path) {
                Ok(Validation::Valid) => {}
                Ok(outcome) => {
                    tracing::info!(path = %path, %outcome, "Outdated");
                    self.outdated.push(path.clone());
                }
                Err(e) => {
                    tracing::warn!(path = %path, error = %e, "Could not validate");
                    self.outdated.push(path.clone());
                }
            }
        }

        let count = self.outdated.len();
        if count > 0 {
            self.status(
                format!("Found {} outdated/missing file(s) - patch required.", count),
                Severity::Warning,
            );
            self.state = SyncState::NeedsDownload;
        } else {
            self.status("All files up to date. Ready to play!", Severity::Success);
            self.state = SyncState::UpToDate;
        }
        self.action(3, CHECK_PHASES, "Step 3/3 - Validation complete");

        Ok(count)
    }

    fn validate_local(&self, path: &str) -> SyncResult<Validation> {
        let entry = self.entry(path)?;
        let local = safety::resolve_within(&self.config.install_root, path).ok_or_else(|| {
            SyncError::PathSafety {
                path: path.to_string(),
            }
        })?;
        checksum::validate_file(&local, entry).map_err(|e| SyncError::filesystem(local, e))
    }

    fn entry(&self, path: &str) -> SyncResult<&ManifestEntry> {
        self.manifest
            .get(path)
            .ok_or_else(|| SyncError::Unexpected(format!("{} is not in the patch list", path)))
    }

    /// Download every outdated file, one at a time, in order.
    ///
    /// Each file gets up to `retry.max_attempts` attempts with exponential
    /// backoff. A file that still fails is recorded in the report and the
    /// remaining files are processed. Afterwards the outdated set holds only
    /// the failed paths. An empty outdated set succeeds immediately.
    pub fn download_outdated(&mut self) -> SyncResult<DownloadReport> {
        let result = self.download_outdated_inner();
        self.settle(result)
    }

    fn download_outdated_inner(&mut self) -> SyncResult<DownloadReport> {
        let mut report = DownloadReport::default();
        let total_files = self.outdated.len();
        if total_files == 0 {
            self.state = SyncState::Done;
            return Ok(report);
        }

        self.cancel.check()?;
        self.state = SyncState::Downloading;

        let total_bytes = self.manifest.total_size(&self.outdated);
        self.status(
            format!(
                "Downloading {} file(s) - {} total",
                total_files,
                format_size(total_bytes)
            ),
            Severity::Info,
        );
        tracing::info!(
            files = total_files,
            bytes = total_bytes,
            "Starting download of {}",
            format_size(total_bytes)
        );

        let mut progress = DownloadProgress {
            total_files,
            file_index: 0,
            total_bytes,
            completed_bytes: 0,
            overall: SpeedTracker::with_interval(self.config.progress_interval),
        };

        let outdated = std::mem::take(&mut self.outdated);
        for (i, path) in outdated.iter().enumerate() {
            if let Err(e) = self.cancel.check() {
                self.outdated = outdated;
                return Err(e);
            }
            progress.file_index = i + 1;

            match self.download_with_retry(path, &mut progress) {
                Ok(bytes) => {
                    progress.completed_bytes += bytes;
                    report.bytes_downloaded += bytes;
                    report.downloaded.push(path.clone());
                }
                Err(SyncError::Cancelled) => {
                    self.outdated = outdated;
                    return Err(SyncError::Cancelled);
                }
                Err(error) => {
                    tracing::error!(path = %path, error = %error, "Failed to download");
                    self.status(
                        format!("FAILED: {} - see logs for details", file_name(path)),
                        Severity::Error,
                    );
                    report.failed.push(FileFailure {
                        path: path.clone(),
                        error,
                    });
                }
            }
        }

        self.outdated = report.failed_paths();
        if report.all_succeeded() {
            self.state = SyncState::Done;
            self.status("Patch complete. Ready to play!", Severity::Success);
        } else {
            self.state = SyncState::PartialFailure;
            self.status(
                format!(
                    "{} of {} file(s) failed to download",
                    report.failed.len(),
                    total_files
                ),
                Severity::Error,
            );
        }
        tracing::info!(
            downloaded = report.downloaded.len(),
            failed = report.failed.len(),
            bytes = report.bytes_downloaded,
            "Download finished"
        );

        Ok(report)
    }

    fn download_with_retry(
        &self,
        path: &str,
        progress: &mut DownloadProgress,
    ) -> SyncResult<u64> {
        let entry = self.entry(path)?.clone();
        let dest = safety::resolve_within(&self.config.install_root, path).ok_or_else(|| {
            tracing::error!(path = %path, "Directory traversal blocked");
            SyncError::PathSafety {
                path: path.to_string(),
            }
        })?;

        let policy = self.config.retry;
        let name = entry.file_name();
        let mut attempt = 1;

        loop {
            self.cancel.check()?;

            let suffix = if attempt > 1 {
                format!(" (attempt {})", attempt)
            } else {
                String::new()
            };
            self.status(
                format!(
                    "[{}/{}] {}{}",
                    progress.file_index, progress.total_files, name, suffix
                ),
                Severity::Info,
            );

            let error = match self.download_attempt(&entry, &dest, progress) {
                Ok(bytes) => {
                    tracing::info!(path = %path, bytes, attempt, "Downloaded OK");
                    return Ok(bytes);
                }
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => e,
            };

            tracing::warn!(path = %path, attempt, error = %error, "Download attempt failed");
            if !policy.has_next(attempt) {
                return Err(error);
            }

            let delay = policy.backoff(attempt);
            let what = match error {
                SyncError::Validation { .. } => "Validation failed for",
                _ => "Error downloading",
            };
            self.status(
                format!(
                    "{} {}, retrying in {:.0}s...",
                    what,
                    name,
                    delay.as_secs_f64()
                ),
                Severity::Warning,
            );
            self.cancel.sleep(delay, policy.poll_interval)?;
            attempt += 1;
        }
    }

    /// One attempt: stream into a same-directory temp file, validate it, then
    /// rename it over `dest`. The temp file is removed on every failure path.
    fn download_attempt(
        &self,
        entry: &ManifestEntry,
        dest: &Path,
        progress: &mut DownloadProgress,
    ) -> SyncResult<u64> {
        if !safety::is_safe(&self.config.install_root, dest) {
            return Err(SyncError::PathSafety {
                path: entry.path.clone(),
            });
        }

        let dir = dest.parent().unwrap_or(&self.config.install_root);
        fs::create_dir_all(dir).map_err(|e| SyncError::filesystem(dir, e))?;

        let mut temp = tempfile::Builder::new()
            .prefix(".locpatcher-")
            .suffix(".part")
            .tempfile_in(dir)
            .map_err(|e| SyncError::filesystem(dir, e))?;

        let url = self.config.file_url(&entry.path);
        self.cancel.check()?;
        let written = {
            let mut stream = self.transport.open_stream(&url)?;
            self.stream_to_file(&url, &mut stream, temp.as_file_mut(), entry, progress)?
        };

        let outcome = checksum::validate_file(temp.path(), entry)
            .map_err(|e| SyncError::filesystem(temp.path(), e))?;
        if !outcome.is_valid() {
            return Err(SyncError::Validation {
                path: entry.path.clone(),
                outcome,
            });
        }

        temp.persist(dest)
            .map_err(|e| SyncError::filesystem(dest, e.error))?;
        Ok(written)
    }

    fn stream_to_file(
        &self,
        url: &str,
        stream: &mut dyn Read,
        file: &mut File,
        entry: &ManifestEntry,
        progress: &mut DownloadProgress,
    ) -> SyncResult<u64> {
        let mut writer = BufWriter::new(file);
        let mut buffer = vec![0u8; self.config.chunk_size];
        let mut written: u64 = 0;
        let mut tracker = SpeedTracker::with_interval(self.config.progress_interval);

        loop {
            self.cancel.check()?;

            let n = match stream.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(SyncError::Network {
                        url: url.to_string(),
                        reason: format!("read error: {}", e),
                    })
                }
            };

            writer
                .write_all(&buffer[..n])
                .map_err(|e| SyncError::filesystem(&entry.path, e))?;
            written += n as u64;

            if written > entry.size {
                return Err(SyncError::Validation {
                    path: entry.path.clone(),
                    outcome: Validation::SizeMismatch {
                        local: written,
                        expected: entry.size,
                    },
                });
            }

            if let Some(rate) = tracker.sample(written) {
                self.report_file_progress(entry, written, rate);
            }
            let overall = progress.completed_bytes + written;
            if let Some(rate) = progress.overall.sample(overall) {
                self.report_overall_progress(progress, overall, rate);
            }
        }

        writer
            .flush()
            .map_err(|e| SyncError::filesystem(&entry.path, e))?;

        self.report_file_progress(entry, written, tracker.update(written));
        let overall = progress.completed_bytes + written;
        self.report_overall_progress(progress, overall, progress.overall.rate());

        Ok(written)
    }

    fn report_file_progress(&self, entry: &ManifestEntry, written: u64, rate: f64) {
        let expected = entry.size;
        let eta = eta_seconds(expected.saturating_sub(written), rate);
        self.step(
            written,
            expected,
            format!(
                "{}  {} / {} ({:.0}%)  {}  ETA {}",
                entry.file_name(),
                format_size(written),
                format_size(expected),
                percent(written, expected),
                format_rate(rate),
                format_eta(eta)
            ),
        );
    }

    fn report_overall_progress(&self, progress: &DownloadProgress, overall: u64, rate: f64) {
        let eta = eta_seconds(progress.total_bytes.saturating_sub(overall), rate);
        self.action(
            overall,
            progress.total_bytes,
            format!(
                "Downloading file {}/{}  {} / {} ({:.0}%)  {}  ETA {}",
                progress.file_index,
                progress.total_files,
                format_size(overall),
                format_size(progress.total_bytes),
                percent(overall, progress.total_bytes),
                format_rate(rate),
                format_eta(eta)
            ),
        );
    }

    /// Delete every tracked file that lives under the install root.
    ///
    /// Paths outside the root and delete failures count as errors. Deleted
    /// and already-absent paths are reconciled and reported once through
    /// `FilesDeleted`, also when the operation is cancelled part way.
    pub fn clear_tracked_files(&mut self, paths: &[String]) -> SyncResult<ClearReport> {
        let result = self.clear_tracked_files_inner(paths);
        self.settle(result)
    }

    fn clear_tracked_files_inner(&mut self, paths: &[String]) -> SyncResult<ClearReport> {
        self.state = SyncState::Clearing;

        let root = self.config.install_root.clone();
        let total = paths.len() as u64;
        let mut report = ClearReport::default();
        let mut cancelled = false;

        self.status(
            format!("Removing {} tracked file(s)...", total),
            Severity::Info,
        );
        tracing::info!(files = total, root = %root.display(), "Clearing tracked files");

        for (i, rel) in paths.iter().enumerate() {
            if self.cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            let idx = i as u64 + 1;
            self.step(
                idx,
                total,
                format!("Removing {}/{}: {}", idx, total, file_name(rel)),
            );

            let Some(local) = safety::resolve_within(&root, rel) else {
                tracing::error!(path = %rel, "Skipping unsafe path");
                report.errored += 1;
                continue;
            };

            if !local.is_file() {
                tracing::debug!(path = %rel, "File not found");
                report.missed += 1;
                report.reconciled.push(rel.clone());
                continue;
            }

            match fs::remove_file(&local) {
                Ok(()) => {
                    tracing::info!(path = %rel, "Deleted");
                    self.status(format!("Deleted {}", file_name(rel)), Severity::Info);
                    report.deleted += 1;
                    report.reconciled.push(rel.clone());
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    report.missed += 1;
                    report.reconciled.push(rel.clone());
                }
                Err(e) => {
                    tracing::error!(path = %rel, error = %e, "Could not delete");
                    self.status(
                        format!("ERROR deleting {}: {}", file_name(rel), e),
                        Severity::Error,
                    );
                    report.errored += 1;
                }
            }
        }

        self.events
            .emit(SyncEvent::FilesDeleted(report.reconciled.clone()));

        if cancelled {
            return Err(SyncError::Cancelled);
        }

        tracing::info!(
            deleted = report.deleted,
            missed = report.missed,
            errored = report.errored,
            "Clear finished"
        );
        let severity = if report.errored > 0 {
            Severity::Warning
        } else {
            Severity::Success
        };
        self.status(
            format!(
                "Removed {} file(s), {} already absent, {} error(s)",
                report.deleted, report.missed, report.errored
            ),
            severity,
        );
        self.state = SyncState::Cleared;

        Ok(report)
    }

    fn settle<R>(&mut self, result: SyncResult<R>) -> SyncResult<R> {
        if let Err(SyncError::Cancelled) = &result {
            if self.state != SyncState::Cancelled {
                tracing::info!("Operation cancelled");
                self.status("Cancelled.", Severity::Warning);
                self.state = SyncState::Cancelled;
            }
        }
        result
    }

    fn status(&self, message: impl Into<String>, severity: Severity) {
        self.events.emit(SyncEvent::Status {
            message: message.into(),
            severity,
        });
    }

    fn step(&self, value: u64, max: u64, label: impl Into<String>) {
        self.events.emit(SyncEvent::StepProgress {
            value,
            max,
            label: label.into(),
        });
    }

    fn action(&self, value: u64, max: u64, label: impl Into<String>) {
        self.events.emit(SyncEvent::ActionProgress {
            value,
            max,
            label: label.into(),
        });
    }
}

/// Host and path of a URL, for compact status lines.
fn short_url(url: &str) -> &str {
    let without_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    without_scheme
        .split(['?', '#'])
        .next()
        .unwrap_or(without_scheme)
}
