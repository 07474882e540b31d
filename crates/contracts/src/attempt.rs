//! DeliveryAttempt - one send attempt for one recipient ("envio")

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{BatchId, Recipient, SendFailure};

/// Attempt identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttemptId(Uuid);

impl AttemptId {
    /// Generate a fresh random id
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Attempt status; terminal once resolved, never retried in place.
/// A retry, if performed, is a new attempt record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    Pending,
    Sent,
    Failed,
}

/// Closed failure taxonomy, alongside the free-form provider message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Send call exceeded the sender's own deadline
    Timeout,
    /// Provider answered and refused the message
    RejectedByProvider,
    /// Contact address unusable (malformed, not on WhatsApp)
    InvalidRecipient,
    /// Everything else (transport, serialization, bugs)
    Internal,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Timeout => "timeout",
            Self::RejectedByProvider => "rejected_by_provider",
            Self::InvalidRecipient => "invalid_recipient",
            Self::Internal => "internal",
        };
        write!(f, "{s}")
    }
}

/// Resolution of an attempt, as reported by the sender
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    Sent,
    Failed(SendFailure),
}

impl AttemptOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent)
    }
}

/// One send attempt for one recipient
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryAttempt {
    /// Unique id
    pub id: AttemptId,

    /// Owning batch; `None` for ad-hoc individual sends
    pub batch_id: Option<BatchId>,

    /// Recipient identifier in the source system
    pub recipient_id: String,

    /// Recipient display name (denormalized for the history view)
    pub recipient_name: String,

    /// WhatsApp contact address the message went to
    pub whatsapp: String,

    /// Fully rendered message body
    pub rendered_body: String,

    /// Template id used, if any
    pub template_id: Option<String>,

    /// Attempt status
    pub status: AttemptStatus,

    /// Creation timestamp (immediately before the send call)
    pub created_at: DateTime<Utc>,

    /// Resolution timestamp, once `Sent` or `Failed`
    pub resolved_at: Option<DateTime<Utc>>,

    /// Failure detail when `Failed`
    pub failure: Option<SendFailure>,
}

/// Fields required to create a pending attempt record
#[derive(Debug, Clone)]
pub struct NewAttempt {
    pub batch_id: Option<BatchId>,
    pub recipient_id: String,
    pub recipient_name: String,
    pub whatsapp: String,
    pub rendered_body: String,
    pub template_id: Option<String>,
}

impl NewAttempt {
    /// Build an attempt record for a recipient within a batch
    pub fn for_batch(
        batch_id: BatchId,
        recipient: &Recipient,
        rendered_body: String,
        template_id: Option<String>,
    ) -> Self {
        Self {
            batch_id: Some(batch_id),
            recipient_id: recipient.record_id().to_string(),
            recipient_name: recipient.name.clone(),
            whatsapp: recipient.whatsapp.clone(),
            rendered_body,
            template_id,
        }
    }

    /// Build an attempt record for an ad-hoc individual send
    pub fn ad_hoc(
        recipient: &Recipient,
        rendered_body: String,
        template_id: Option<String>,
    ) -> Self {
        Self {
            batch_id: None,
            recipient_id: recipient.record_id().to_string(),
            recipient_name: recipient.name.clone(),
            whatsapp: recipient.whatsapp.clone(),
            rendered_body,
            template_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipient() -> Recipient {
        Recipient {
            id: "a1".into(),
            name: "Ana".into(),
            whatsapp: "+5511999990000".into(),
            plan: Some("Premium".into()),
            email: None,
        }
    }

    #[test]
    fn test_for_batch_carries_recipient_fields() {
        let batch_id = BatchId::generate();
        let a = NewAttempt::for_batch(batch_id, &recipient(), "Olá Ana".into(), None);
        assert_eq!(a.batch_id, Some(batch_id));
        assert_eq!(a.recipient_id, "a1");
        assert_eq!(a.whatsapp, "+5511999990000");
    }

    #[test]
    fn test_ad_hoc_has_no_batch() {
        let a = NewAttempt::ad_hoc(&recipient(), "Olá".into(), Some("boas_vindas".into()));
        assert!(a.batch_id.is_none());
        assert_eq!(a.template_id.as_deref(), Some("boas_vindas"));
    }

    #[test]
    fn test_failure_kind_serde() {
        let json = serde_json::to_string(&FailureKind::RejectedByProvider).unwrap();
        assert_eq!(json, "\"rejected_by_provider\"");
    }
}
