//! Message templates and the dispatch-time template choice

use serde::{Deserialize, Serialize};

/// A named, reusable message template from the plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageTemplate {
    /// Stable id referenced by dispatch requests
    pub id: String,

    /// Operator-facing display name ("Boas-vindas", "Lembrete de consulta")
    pub name: String,

    /// Body with `{{variable}}` placeholders
    pub body: String,
}

/// What to send: a named template from the plan, or an inline body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateSpec {
    /// Reference a template by id
    Template { id: String },
    /// Raw message body supplied with the request
    Inline { body: String },
}

impl TemplateSpec {
    pub fn template(id: impl Into<String>) -> Self {
        Self::Template { id: id.into() }
    }

    pub fn inline(body: impl Into<String>) -> Self {
        Self::Inline { body: body.into() }
    }

    /// Template id, when this spec references one
    pub fn template_id(&self) -> Option<&str> {
        match self {
            Self::Template { id } => Some(id),
            Self::Inline { .. } => None,
        }
    }
}
