//! MessageSender trait - provider send interface
//!
//! Defines the abstract interface for message providers. The provider is
//! opaque: one call, one message, success or a typed failure. Senders own
//! their per-call timeout.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{FailureKind, Recipient};

/// Typed send failure; `message` keeps the provider's free-form detail
/// for display, `kind` is the closed taxonomy dashboards reason about.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct SendFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl SendFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Timeout, message)
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::new(FailureKind::RejectedByProvider, message)
    }

    pub fn invalid_recipient(message: impl Into<String>) -> Self {
        Self::new(FailureKind::InvalidRecipient, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Internal, message)
    }
}

/// Message provider trait
///
/// All sender implementations must implement this trait.
#[trait_variant::make(MessageSender: Send)]
pub trait LocalMessageSender {
    /// Sender name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Deliver one rendered message to one recipient
    ///
    /// # Errors
    /// Returns a typed failure; the caller records it and moves on,
    /// since a send failure must never abort the surrounding batch.
    async fn send(&self, recipient: &Recipient, body: &str) -> Result<(), SendFailure>;
}
