//! Dispatch engine configuration contracts that can be shared across crates.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Dispatch engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Max sends per rolling 60-minute window (provider ceiling)
    #[serde(default = "default_hourly_limit")]
    pub hourly_limit: usize,

    /// Randomized inter-message delay
    #[serde(default)]
    pub jitter: JitterConfig,

    /// Bounded retry for attempt-record persistence
    #[serde(default)]
    pub persist_retry: PersistRetryConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            hourly_limit: default_hourly_limit(),
            jitter: JitterConfig::default(),
            persist_retry: PersistRetryConfig::default(),
        }
    }
}

fn default_hourly_limit() -> usize {
    100
}

/// Inter-message jitter range; drawn uniformly per recipient
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct JitterConfig {
    /// Minimum delay in milliseconds
    pub min_ms: u64,
    /// Maximum delay in milliseconds
    pub max_ms: u64,
}

impl JitterConfig {
    /// A zero-width range, for tests and ad-hoc sends
    pub fn none() -> Self {
        Self { min_ms: 0, max_ms: 0 }
    }
}

impl Default for JitterConfig {
    fn default() -> Self {
        // Provider anti-flood pacing; the dominant latency driver of a batch
        Self {
            min_ms: 5_000,
            max_ms: 15_000,
        }
    }
}

/// Bounded backoff for persisting attempt records
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PersistRetryConfig {
    /// Attempts before giving up and flagging the batch audit-degraded
    pub max_attempts: u32,
    /// Base backoff between attempts, doubled each retry
    pub backoff_ms: u64,
}

impl PersistRetryConfig {
    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

impl Default for PersistRetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_ms: 200,
        }
    }
}
