//! Retry policy for per-file downloads.

use std::time::Duration;

use super::cancel::DEFAULT_POLL_INTERVAL;

/// Attempts per file before it is reported as failed.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Delay before the second attempt; doubles for each attempt after that.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(2);

/// Fixed exponential backoff, no jitter and no cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum attempts per file (minimum 1).
    pub max_attempts: u32,
    /// Base backoff delay.
    pub base_delay: Duration,
    /// How often a backoff sleep checks for cancellation.
    pub poll_interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl RetryPolicy {
    /// Create a policy with the given attempt count and base delay.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            ..Self::default()
        }
    }

    /// Set the cancellation polling interval.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Backoff after the failed `attempt` (1-based): `base * 2^(attempt-1)`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base_delay.saturating_mul(1u32 << exponent)
    }

    /// Whether another attempt follows `attempt`.
    pub fn has_next(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}
