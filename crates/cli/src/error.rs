//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[allow(dead_code)]
#[derive(Error, Debug)]
pub enum CliError {
    /// Plan file not found
    #[error("Plan file not found: {path}")]
    PlanNotFound { path: String },

    /// Plan parsing error
    #[error("Failed to parse plan: {message}")]
    PlanParse { message: String },

    /// Recipient list error
    #[error("Failed to load recipients from {path}: {message}")]
    Recipients { path: String, message: String },

    /// Malformed --var argument
    #[error("Invalid variable '{raw}': expected KEY=VALUE")]
    InvalidVariable { raw: String },

    /// Campaign execution error
    #[error("Campaign execution failed: {message}")]
    CampaignExecution { message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error wrapper
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

#[allow(dead_code)]
impl CliError {
    pub fn plan_not_found(path: impl Into<String>) -> Self {
        Self::PlanNotFound { path: path.into() }
    }

    pub fn plan_parse(message: impl Into<String>) -> Self {
        Self::PlanParse {
            message: message.into(),
        }
    }

    pub fn recipients(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Recipients {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn campaign_execution(message: impl Into<String>) -> Self {
        Self::CampaignExecution {
            message: message.into(),
        }
    }
}

/// Result type alias for CLI operations
#[allow(dead_code)]
pub type Result<T> = std::result::Result<T, CliError>;
