//! Recipient list loading
//!
//! Recipients arrive as a JSON array exported by the admin console:
//! `[{ "nome": "...", "whatsapp": "...", "plano": "...", ... }, ...]`.

use std::path::Path;

use contracts::Recipient;
use tracing::info;

use crate::error::CliError;

/// Load a recipient list from a JSON file
pub fn load_recipients(path: &Path) -> Result<Vec<Recipient>, CliError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| CliError::recipients(path.display().to_string(), e.to_string()))?;

    let recipients: Vec<Recipient> = serde_json::from_str(&content)
        .map_err(|e| CliError::recipients(path.display().to_string(), e.to_string()))?;

    for (idx, recipient) in recipients.iter().enumerate() {
        if recipient.whatsapp.trim().is_empty() {
            return Err(CliError::recipients(
                path.display().to_string(),
                format!("recipient[{idx}] has an empty whatsapp contact"),
            ));
        }
    }

    info!(
        path = %path.display(),
        count = recipients.len(),
        "Recipient list loaded"
    );
    Ok(recipients)
}
