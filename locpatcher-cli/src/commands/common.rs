//! Shared plumbing: configuration lookup and the worker/renderer split.

use std::path::Path;
use std::sync::mpsc;
use std::thread;

use locpatcher::config::{tracked_files_path, ConfigFile, TrackedFiles};
use locpatcher::net::HttpTransport;
use locpatcher::sync::{SyncConfig, SyncError, SyncResult, SyncSession};

use crate::error::CliError;
use crate::progress::EventRenderer;

/// Session type every command drives.
pub type Session = SyncSession<HttpTransport>;

/// Load `config.ini`, falling back to defaults when it does not exist.
pub fn load_config() -> Result<ConfigFile, CliError> {
    Ok(ConfigFile::load()?)
}

/// Engine configuration for the `--dir` override or the stored directory.
pub fn resolve_sync_config(config: &ConfigFile, dir: Option<&Path>) -> Result<SyncConfig, CliError> {
    let sync = config.sync_config(dir).ok_or_else(|| {
        CliError::Config("no game directory configured".to_string())
    })?;

    if !sync.install_root.is_dir() {
        return Err(CliError::Config(format!(
            "game directory '{}' does not exist",
            sync.install_root.display()
        )));
    }
    Ok(sync)
}

/// Load the tracked-file list from its default location.
pub fn load_tracked() -> Result<TrackedFiles, CliError> {
    let path = tracked_files_path();
    TrackedFiles::load_from(&path).map_err(|error| CliError::TrackedFiles { path, error })
}

/// Run `job` against a fresh session on a worker thread while this thread
/// renders its events.
///
/// Ctrl+C cancels the session. The renderer drains every event, including
/// those sent while the job unwinds from a cancellation, before the job's
/// result is returned.
pub fn run_session<F, R>(
    config: &ConfigFile,
    sync_config: SyncConfig,
    job: F,
) -> Result<(R, TrackedFiles), CliError>
where
    F: FnOnce(&mut Session) -> SyncResult<R> + Send + 'static,
    R: Send + 'static,
{
    let transport = HttpTransport::with_config(config.network_config())
        .map_err(|e| CliError::Sync(SyncError::from(e)))?;

    let tracked = load_tracked()?;
    let (tx, rx) = mpsc::channel();
    let mut session = SyncSession::new(sync_config, transport, tx);

    let cancel = session.cancel_token();
    ctrlc::set_handler(move || {
        eprintln!();
        eprintln!("Cancelling...");
        cancel.cancel();
    })
    .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))?;

    let worker = thread::Builder::new()
        .name("sync-worker".to_string())
        .spawn(move || job(&mut session))
        .map_err(|e| CliError::Worker(e.to_string()))?;

    let rendered = EventRenderer::new(tracked, tracked_files_path()).run(rx);

    let result = worker
        .join()
        .map_err(|_| CliError::Worker("sync worker panicked".to_string()))?;

    let value = result?;
    Ok((value, rendered?))
}
