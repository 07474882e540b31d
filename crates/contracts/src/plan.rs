//! DispatchPlan - Config Loader output
//!
//! Describes the full dispatch setup: engine tuning, provider sender,
//! named message templates.

use serde::{Deserialize, Serialize};

use crate::{EngineConfig, MessageTemplate};

/// Plan format version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlanVersion {
    #[default]
    V1,
}

/// Complete dispatch plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchPlan {
    /// Plan version
    #[serde(default)]
    pub version: PlanVersion,

    /// Engine tuning (rate ceiling, jitter, persistence retry)
    #[serde(default)]
    pub engine: EngineConfig,

    /// Provider sender selection
    #[serde(default)]
    pub sender: SenderConfig,

    /// Named message templates
    #[serde(default)]
    pub templates: Vec<MessageTemplate>,
}

impl DispatchPlan {
    /// Look up a template by id
    pub fn find_template(&self, id: &str) -> Option<&MessageTemplate> {
        self.templates.iter().find(|t| t.id == id)
    }
}

/// Which sender implementation to run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SenderConfig {
    /// Log-only sender; nothing leaves the process (dry runs)
    #[default]
    Log,

    /// HTTP WhatsApp gateway
    Http {
        /// Gateway endpoint URL
        url: String,

        /// Bearer token, if the gateway requires one
        #[serde(default)]
        token: Option<String>,

        /// Per-send request timeout in milliseconds
        #[serde(default = "default_send_timeout_ms")]
        timeout_ms: u64,
    },
}

fn default_send_timeout_ms() -> u64 {
    30_000
}
