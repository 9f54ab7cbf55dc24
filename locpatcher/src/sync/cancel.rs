//! Cooperative cancellation shared between the worker and its caller.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use super::error::{SyncError, SyncResult};

/// Default polling interval for cancellable sleeps.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Cloneable cancellation flag.
///
/// Clones share one flag, so a UI or signal handler can hold a clone and stop
/// a session running on another thread. The flag is only ever observed at the
/// engine's checkpoints; nothing is interrupted preemptively.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create an unset token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Checkpoint: `Err(Cancelled)` once cancellation was requested.
    pub fn check(&self) -> SyncResult<()> {
        if self.is_cancelled() {
            Err(SyncError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Sleep for `duration`, waking every `poll` to check the flag.
    ///
    /// Returns `Err(Cancelled)` within one poll interval of a cancel request.
    pub fn sleep(&self, duration: Duration, poll: Duration) -> SyncResult<()> {
        let deadline = Instant::now() + duration;
        loop {
            self.check()?;
            let now = Instant::now();
            if now >= deadline {
                return Ok(());
            }
            thread::sleep(poll.min(deadline - now));
        }
    }
}
