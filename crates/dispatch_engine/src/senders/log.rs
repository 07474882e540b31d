//! LogSender - logs the message instead of sending it

use contracts::{MessageSender, Recipient, SendFailure};
use tracing::{info, instrument};

/// Sender for dry runs: every message is accepted and logged, nothing
/// leaves the process.
pub struct LogSender {
    name: String,
}

impl LogSender {
    /// Create a new LogSender with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for LogSender {
    fn default() -> Self {
        Self::new("log")
    }
}

impl MessageSender for LogSender {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sender_send",
        skip(self, recipient, body),
        fields(sender = %self.name, recipient = %recipient.whatsapp)
    )]
    async fn send(&self, recipient: &Recipient, body: &str) -> Result<(), SendFailure> {
        info!(
            sender = %self.name,
            recipient = %recipient.whatsapp,
            chars = body.chars().count(),
            "Dry-run send"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_sender_accepts_everything() {
        let sender = LogSender::new("dry_run");
        let recipient = Recipient {
            id: "a1".into(),
            name: "Ana".into(),
            whatsapp: "+5511999990000".into(),
            plan: None,
            email: None,
        };
        assert!(sender.send(&recipient, "Olá Ana").await.is_ok());
        assert_eq!(sender.name(), "dry_run");
    }
}
