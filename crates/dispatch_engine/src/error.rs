//! Dispatch engine error types

use contracts::{BatchId, BatchStatus, ContractError};
use thiserror::Error;

/// Engine-specific errors
///
/// Everything here surfaces synchronously at dispatch/resume time; nothing
/// inside the per-recipient loop propagates as an error that stops a batch.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Dispatch requested with no recipients
    #[error("dispatch rejected: recipient list is empty")]
    EmptyRecipients,

    /// Template id not present in the loaded plan
    #[error("dispatch rejected: template '{template_id}' not found")]
    TemplateNotFound { template_id: String },

    /// A worker for this batch id is already running
    #[error("batch {batch_id} already has an active worker")]
    BatchAlreadyActive { batch_id: BatchId },

    /// Resume requested for a batch not left in progress
    #[error("batch {batch_id} is {status:?}, not resumable")]
    BatchNotResumable {
        batch_id: BatchId,
        status: BatchStatus,
    },

    /// Resume recipient list does not match the batch record
    #[error("batch {batch_id} expects {expected} recipients, got {got}")]
    RecipientCountMismatch {
        batch_id: BatchId,
        expected: usize,
        got: usize,
    },

    /// Sender construction failed
    #[error("failed to build sender '{name}': {message}")]
    SenderCreation { name: String, message: String },

    /// Worker task died (panic or abort)
    #[error("batch worker failed: {message}")]
    Worker { message: String },

    /// Store/contract error during pre-flight
    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl EngineError {
    /// Create a sender creation error
    pub fn sender_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SenderCreation {
            name: name.into(),
            message: message.into(),
        }
    }
}
