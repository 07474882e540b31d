//! Batch - one bulk-send operation ("lote")

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Batch identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchId(Uuid);

impl BatchId {
    /// Generate a fresh random id
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for BatchId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Batch lifecycle status
///
/// `Pending -> InProgress -> Completed`, with `Cancelled` terminal and
/// reachable from `InProgress` only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl BatchStatus {
    /// Terminal statuses admit no further transition
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Whether the lifecycle permits moving to `next`
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::InProgress)
                | (Self::InProgress, Self::Completed)
                | (Self::InProgress, Self::Cancelled)
        )
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

/// One bulk-send operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    /// Unique id
    pub id: BatchId,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Template id used, when the message came from a named template
    pub template_id: Option<String>,

    /// Raw message body actually used (pre-substitution)
    pub body: String,

    /// Recipient count, fixed at creation
    pub total_recipients: usize,

    /// Successful attempts so far (monotonic)
    pub sent: u64,

    /// Failed attempts so far (monotonic)
    pub failed: u64,

    /// Lifecycle status
    pub status: BatchStatus,

    /// Opaque snapshot of the selection criteria that produced the
    /// recipient list; audit only, never re-evaluated
    pub filters_used: Option<serde_json::Value>,

    /// Set when an attempt record could not be persisted after bounded
    /// retries; delivery continued, the audit trail has gaps
    pub audit_degraded: bool,
}

impl Batch {
    /// All recipients have a resolved attempt
    pub fn is_settled(&self) -> bool {
        self.sent + self.failed == self.total_recipients as u64
    }
}

/// Fields required to create a batch record
#[derive(Debug, Clone)]
pub struct NewBatch {
    pub template_id: Option<String>,
    pub body: String,
    pub total_recipients: usize,
    pub filters_used: Option<serde_json::Value>,
}
