//! Recipient - one message destination
//!
//! Field aliases accept the Portuguese keys emitted by the admin console
//! (`nome`, `plano`) alongside the English names.

use serde::{Deserialize, Serialize};

/// A single message recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    /// Stable identifier in the source system (associate id)
    #[serde(default)]
    pub id: String,

    /// Display name, substituted for `{{nome}}`
    #[serde(alias = "nome")]
    pub name: String,

    /// WhatsApp contact address (E.164 or provider-local format)
    pub whatsapp: String,

    /// Membership plan, substituted for `{{plano}}`
    #[serde(default, alias = "plano")]
    pub plan: Option<String>,

    /// Email, substituted for `{{email}}`
    #[serde(default)]
    pub email: Option<String>,
}

impl Recipient {
    /// Identifier used for attempt records; falls back to the contact
    /// address when the source system supplied no id.
    pub fn record_id(&self) -> &str {
        if self.id.is_empty() {
            &self.whatsapp
        } else {
            &self.id
        }
    }
}
