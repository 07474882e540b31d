//! Per-batch worker metrics for observability
//!
//! Lock-free mirror of the store counters, for live progress display; the
//! store record stays authoritative.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for a single batch worker
#[derive(Debug, Default)]
pub struct WorkerMetrics {
    /// Successful sends
    sent: AtomicU64,
    /// Failed sends
    failed: AtomicU64,
    /// Times the worker slept waiting for rate-window capacity
    rate_waits: AtomicU64,
    /// Attempt records lost to persistence failures
    audit_gaps: AtomicU64,
}

impl WorkerMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Get successful send count
    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    /// Increment successful send count
    pub fn inc_sent(&self) {
        self.sent.fetch_add(1, Ordering::Relaxed);
    }

    /// Get failed send count
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    /// Increment failed send count
    pub fn inc_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Get rate-wait count
    pub fn rate_waits(&self) -> u64 {
        self.rate_waits.load(Ordering::Relaxed)
    }

    /// Increment rate-wait count
    pub fn inc_rate_waits(&self) {
        self.rate_waits.fetch_add(1, Ordering::Relaxed);
    }

    /// Get audit-gap count
    pub fn audit_gaps(&self) -> u64 {
        self.audit_gaps.load(Ordering::Relaxed)
    }

    /// Increment audit-gap count
    pub fn inc_audit_gaps(&self) {
        self.audit_gaps.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            sent: self.sent(),
            failed: self.failed(),
            rate_waits: self.rate_waits(),
            audit_gaps: self.audit_gaps(),
        }
    }
}

/// Snapshot of worker metrics (for reporting)
#[derive(Debug, Clone, Copy)]
pub struct ProgressSnapshot {
    pub sent: u64,
    pub failed: u64,
    pub rate_waits: u64,
    pub audit_gaps: u64,
}

impl ProgressSnapshot {
    /// Recipients attempted so far
    pub fn attempted(&self) -> u64 {
        self.sent + self.failed
    }
}
