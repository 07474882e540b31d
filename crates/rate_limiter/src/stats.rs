//! StatsReporter - read-only rate consumption view for operator displays

use std::sync::Arc;

use crate::{HourlyRateLimiter, RateSnapshot};

/// Read-only pass-through over the shared limiter.
///
/// Handed to anything that renders "X/Y sent this hour, resets in N
/// minutes"; carries no mutation capability.
#[derive(Debug, Clone)]
pub struct StatsReporter {
    limiter: Arc<HourlyRateLimiter>,
}

impl StatsReporter {
    pub fn new(limiter: Arc<HourlyRateLimiter>) -> Self {
        Self { limiter }
    }

    /// Current window consumption
    pub fn current(&self) -> RateSnapshot {
        self.limiter.snapshot()
    }
}
