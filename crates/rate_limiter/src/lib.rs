//! # Rate Limiter
//!
//! Process-wide sliding-window limiter for the provider's hourly send
//! ceiling. The window is a time-ordered sequence of send instants,
//! pruned lazily from the front on every call, O(1) amortized.
//!
//! State is advisory and local: it resets on process restart and never
//! claims more sends than this process attempted. All batch workers share
//! one instance; this is the only shared mutable state in the subsystem.

mod stats;

pub use stats::StatsReporter;

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::trace;

/// Default rolling window
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60 * 60);

/// Outcome of a capacity check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// Capacity available; a send instant was recorded
    Allowed,
    /// Ceiling reached; capacity frees up after `retry_after`
    Throttled { retry_after: Duration },
}

impl Gate {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Read-only view of the current window
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RateSnapshot {
    /// Sends recorded within the trailing window
    pub sent: usize,
    /// Configured ceiling
    pub limit: usize,
    /// Time until the oldest entry expires; zero when the window is empty
    pub reset_in: Duration,
}

impl RateSnapshot {
    /// Remaining capacity in the current window
    pub fn remaining(&self) -> usize {
        self.limit.saturating_sub(self.sent)
    }
}

/// Sliding-window limiter over a rolling window (60 minutes by default)
#[derive(Debug)]
pub struct HourlyRateLimiter {
    limit: usize,
    window: Duration,
    sends: Mutex<VecDeque<Instant>>,
}

impl HourlyRateLimiter {
    /// Limiter with the default 60-minute window
    pub fn new(limit: usize) -> Self {
        Self::with_window(limit, DEFAULT_WINDOW)
    }

    /// Limiter with a custom window (tests, provider-specific periods)
    pub fn with_window(limit: usize, window: Duration) -> Self {
        Self {
            limit,
            window,
            sends: Mutex::new(VecDeque::new()),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Check capacity and, when available, record a send instant.
    ///
    /// When throttled, `retry_after` is the time until the oldest recorded
    /// instant leaves the window: always positive, never above the window
    /// length.
    pub fn try_acquire(&self) -> Gate {
        let now = Instant::now();
        let mut sends = self.sends.lock().unwrap();
        Self::prune(&mut sends, now, self.window);

        if sends.len() < self.limit {
            sends.push_back(now);
            Gate::Allowed
        } else {
            let retry_after = sends
                .front()
                .map_or(self.window, |oldest| (*oldest + self.window) - now);
            trace!(in_window = sends.len(), limit = self.limit, ?retry_after, "Send throttled");
            Gate::Throttled { retry_after }
        }
    }

    /// Read-only view for operator displays; prunes but never records
    pub fn snapshot(&self) -> RateSnapshot {
        let now = Instant::now();
        let mut sends = self.sends.lock().unwrap();
        Self::prune(&mut sends, now, self.window);

        let reset_in = sends
            .front()
            .map_or(Duration::ZERO, |oldest| (*oldest + self.window) - now);

        RateSnapshot {
            sent: sends.len(),
            limit: self.limit,
            reset_in,
        }
    }

    /// Drop instants that have left the trailing window
    fn prune(sends: &mut VecDeque<Instant>, now: Instant, window: Duration) {
        while let Some(oldest) = sends.front() {
            if now.duration_since(*oldest) >= window {
                sends.pop_front();
            } else {
                break;
            }
        }
    }
}
