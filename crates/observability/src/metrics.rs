//! Dispatch metrics collection
//!
//! Gauges for the live rate window, counters for settled batches, and an
//! in-memory aggregator over attempt records for end-of-run summaries.
//! Per-attempt counters are emitted by the worker itself.

use std::collections::HashMap;
use std::time::Duration;

use contracts::{AttemptStatus, BatchStatus, DeliveryAttempt};
use metrics::{counter, gauge};

/// Record the current rate-window consumption
///
/// Call whenever a stats snapshot is taken so dashboards track the
/// "X of Y this hour" view.
pub fn record_rate_snapshot(sent: usize, limit: usize, reset_in: Duration) {
    gauge!("dispatch_rate_window_in_use").set(sent as f64);
    gauge!("dispatch_rate_window_limit").set(limit as f64);
    gauge!("dispatch_rate_window_reset_seconds").set(reset_in.as_secs_f64());
}

/// Record a batch reaching a terminal status
pub fn record_batch_settled(status: BatchStatus) {
    counter!(
        "dispatch_batches_total",
        "status" => status.to_string()
    )
    .increment(1);
}

/// Attempt metrics aggregator
///
/// Aggregates attempt records in memory for summary output.
#[derive(Debug, Clone, Default)]
pub struct DispatchMetricsAggregator {
    /// Total attempts seen
    pub total_attempts: u64,

    /// Successful sends
    pub total_sent: u64,

    /// Failed sends
    pub total_failed: u64,

    /// Attempts still pending (should be zero after a settled batch)
    pub total_pending: u64,

    /// Failure counts per kind
    pub failure_kinds: HashMap<String, u64>,

    /// Send resolution latency statistics (milliseconds)
    pub resolve_latency_ms: RunningStats,
}

impl DispatchMetricsAggregator {
    /// Create a new aggregator
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one attempt record into the aggregate
    pub fn update(&mut self, attempt: &DeliveryAttempt) {
        self.total_attempts += 1;

        match attempt.status {
            AttemptStatus::Sent => self.total_sent += 1,
            AttemptStatus::Failed => {
                self.total_failed += 1;
                if let Some(failure) = &attempt.failure {
                    *self
                        .failure_kinds
                        .entry(failure.kind.to_string())
                        .or_insert(0) += 1;
                }
            }
            AttemptStatus::Pending => self.total_pending += 1,
        }

        if let Some(resolved_at) = attempt.resolved_at {
            let latency = resolved_at - attempt.created_at;
            self.resolve_latency_ms.push(latency.num_milliseconds() as f64);
        }
    }

    /// Produce the summary report
    pub fn summary(&self) -> DispatchSummary {
        DispatchSummary {
            total_attempts: self.total_attempts,
            total_sent: self.total_sent,
            total_failed: self.total_failed,
            total_pending: self.total_pending,
            failure_rate: if self.total_attempts > 0 {
                self.total_failed as f64 / self.total_attempts as f64 * 100.0
            } else {
                0.0
            },
            failure_kinds: self.failure_kinds.clone(),
            resolve_latency_ms: StatsSummary::from(&self.resolve_latency_ms),
        }
    }

    /// Reset the aggregate
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Dispatch summary
#[derive(Debug, Clone, Default)]
pub struct DispatchSummary {
    pub total_attempts: u64,
    pub total_sent: u64,
    pub total_failed: u64,
    pub total_pending: u64,
    pub failure_rate: f64,
    pub failure_kinds: HashMap<String, u64>,
    pub resolve_latency_ms: StatsSummary,
}

impl std::fmt::Display for DispatchSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Dispatch Summary ===")?;
        writeln!(f, "Total attempts: {}", self.total_attempts)?;
        writeln!(f, "Sent: {}", self.total_sent)?;
        writeln!(
            f,
            "Failed: {} ({:.2}%)",
            self.total_failed, self.failure_rate
        )?;
        if self.total_pending > 0 {
            writeln!(f, "Still pending: {}", self.total_pending)?;
        }
        writeln!(f, "Resolution latency (ms): {}", self.resolve_latency_ms)?;

        if !self.failure_kinds.is_empty() {
            writeln!(f, "Failure kinds:")?;
            let mut kinds: Vec<_> = self.failure_kinds.iter().collect();
            kinds.sort();
            for (kind, count) in kinds {
                writeln!(f, "  {}: {}", kind, count)?;
            }
        }

        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count(),
            min: stats.min(),
            max: stats.max(),
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics calculator (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// Push a new value
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// Sample count
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Mean
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// Standard deviation
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Minimum
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Maximum
    pub fn max(&self) -> f64 {
        self.max
    }
}
