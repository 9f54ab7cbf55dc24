//! Transfer rate estimation for download progress.
//!
//! The estimate is a plain average since the tracker was created rather than
//! a sliding window; patch files download in seconds to minutes, so the
//! average settles quickly. Refreshing it at most every half second keeps the
//! displayed rate from jittering and doubles as the progress event throttle.

use std::time::{Duration, Instant};

/// Default minimum time between rate refreshes.
pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_millis(500);

/// Average-since-start throughput estimator.
#[derive(Debug, Clone)]
pub struct SpeedTracker {
    interval: Duration,
    start: Instant,
    last_update: Instant,
    rate: f64,
}

impl Default for SpeedTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeedTracker {
    /// Start tracking now with the default refresh interval.
    pub fn new() -> Self {
        Self::with_interval(DEFAULT_UPDATE_INTERVAL)
    }

    /// Start tracking now with a custom refresh interval.
    pub fn with_interval(interval: Duration) -> Self {
        Self::started_at(Instant::now(), interval)
    }

    /// Start tracking from an explicit instant.
    pub fn started_at(start: Instant, interval: Duration) -> Self {
        Self {
            interval,
            start,
            last_update: start,
            rate: 0.0,
        }
    }

    /// Latest rate estimate in bytes per second.
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Feed the cumulative byte count and return the latest estimate.
    pub fn update(&mut self, bytes_so_far: u64) -> f64 {
        self.update_at(bytes_so_far, Instant::now());
        self.rate
    }

    /// Feed the cumulative byte count; returns `Some(rate)` only when the
    /// estimate was refreshed by this call.
    pub fn sample(&mut self, bytes_so_far: u64) -> Option<f64> {
        self.update_at(bytes_so_far, Instant::now())
    }

    /// Clock-explicit form of [`SpeedTracker::sample`].
    pub fn update_at(&mut self, bytes_so_far: u64, now: Instant) -> Option<f64> {
        if now.saturating_duration_since(self.last_update) < self.interval {
            return None;
        }

        let elapsed = now.saturating_duration_since(self.start).as_secs_f64();
        if elapsed > 0.0 {
            self.rate = bytes_so_far as f64 / elapsed;
        }
        self.last_update = now;
        Some(self.rate)
    }
}

/// Seconds until `remaining` bytes arrive at `rate`; infinite when the rate is
/// not yet known.
pub fn eta_seconds(remaining: u64, rate: f64) -> f64 {
    if rate > 0.0 {
        remaining as f64 / rate
    } else {
        f64::INFINITY
    }
}
