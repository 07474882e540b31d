//! Layered error definitions
//!
//! Categorized by source: config / template / dispatch / store

use thiserror::Error;

use crate::{AttemptId, BatchId, BatchStatus};

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Template Errors =====
    /// Referenced template does not exist in the plan
    #[error("template not found: {template_id}")]
    TemplateNotFound { template_id: String },

    // ===== Dispatch Errors =====
    /// Request rejected before a batch record was created
    #[error("dispatch rejected: {message}")]
    DispatchValidation { message: String },

    // ===== Store Errors =====
    /// Batch lookup miss
    #[error("batch not found: {batch_id}")]
    BatchNotFound { batch_id: BatchId },

    /// Attempt lookup miss
    #[error("attempt not found: {attempt_id}")]
    AttemptNotFound { attempt_id: AttemptId },

    /// A second in-flight attempt for the same (batch, recipient) pair
    #[error("pending attempt already exists for recipient '{recipient_id}' in batch {batch_id}")]
    DuplicatePendingAttempt {
        batch_id: BatchId,
        recipient_id: String,
    },

    /// Batch status transition violates the lifecycle
    #[error("illegal status transition for batch {batch_id}: {from:?} -> {to:?}")]
    IllegalTransition {
        batch_id: BatchId,
        from: BatchStatus,
        to: BatchStatus,
    },

    /// Store-level write/read failure
    #[error("store error: {message}")]
    Store { message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create dispatch validation error
    pub fn dispatch_validation(message: impl Into<String>) -> Self {
        Self::DispatchValidation {
            message: message.into(),
        }
    }

    /// Create template-not-found error
    pub fn template_not_found(template_id: impl Into<String>) -> Self {
        Self::TemplateNotFound {
            template_id: template_id.into(),
        }
    }

    /// Create store error
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }
}
