//! Synchronization engine.
//!
//! A [`SyncSession`] brings an installation in line with the remote patch
//! list in three steps:
//!
//! 1. **Fetch** the patch list ([`SyncSession::fetch_manifest`])
//! 2. **Check** local files: existence scan, then size and CRC-32 validation
//!    ([`SyncSession::check_local_files`])
//! 3. **Download** every outdated file with retry and backoff
//!    ([`SyncSession::download_outdated`])
//!
//! [`SyncSession::clear_tracked_files`] removes previously tracked files.
//!
//! # Threading
//!
//! Operations block. Run them on a worker thread, hand the UI the receiving
//! end of an mpsc channel (the sending half implements [`EventSink`]), and
//! cancel through a cloned [`CancelToken`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::mpsc;
//! use locpatcher::net::HttpTransport;
//! use locpatcher::sync::{SyncConfig, SyncSession};
//!
//! let (tx, rx) = mpsc::channel();
//! let transport = HttpTransport::new()?;
//! let mut session = SyncSession::new(SyncConfig::new("/games/LastOasis"), transport, tx);
//!
//! let worker = std::thread::spawn(move || {
//!     let outdated = session.check_for_updates()?;
//!     if outdated > 0 {
//!         session.download_outdated()?;
//!     }
//!     Ok::<_, locpatcher::sync::SyncError>(())
//! });
//!
//! for event in rx {
//!     println!("{:?}", event);
//! }
//! worker.join().ok();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod cancel;
mod config;
mod error;
mod events;
mod report;
mod retry;
mod session;
mod state;

pub use cancel::{CancelToken, DEFAULT_POLL_INTERVAL};
pub use config::{SyncConfig, DEFAULT_CHUNK_SIZE, DEFAULT_MANIFEST_URL, DEFAULT_REMOTE_HOST};
pub use error::{SyncError, SyncResult};
pub use events::{EventSink, NullSink, RecordingSink, Severity, SyncEvent};
pub use report::{ClearReport, DownloadReport, FileFailure};
pub use retry::{RetryPolicy, DEFAULT_BASE_DELAY, DEFAULT_MAX_ATTEMPTS};
pub use session::SyncSession;
pub use state::{capabilities, Action, AppState, Capabilities, SyncState};
