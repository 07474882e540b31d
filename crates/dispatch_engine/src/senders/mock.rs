//! Mock sender
//!
//! Test double with injectable per-contact failures, an optional per-send
//! delay, and an event stream for observing send order from tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use contracts::{MessageSender, Recipient, SendFailure};
use tokio::sync::mpsc;
use tokio::time::sleep;

/// One successfully "delivered" message
#[derive(Debug, Clone)]
pub struct SentMessage {
    pub whatsapp: String,
    pub body: String,
}

/// Mock sender configuration
#[derive(Debug, Default)]
pub struct MockSenderConfig {
    /// Contacts that should fail, with the failure to return
    pub fail_contacts: HashMap<String, SendFailure>,
    /// Delay applied to every send call
    pub delay: Option<Duration>,
}

/// Mock message sender
pub struct MockSender {
    config: MockSenderConfig,
    sent: Mutex<Vec<SentMessage>>,
    events: Mutex<Option<mpsc::UnboundedSender<String>>>,
}

impl MockSender {
    /// Sender that accepts everything instantly
    pub fn new() -> Self {
        Self::with_config(MockSenderConfig::default())
    }

    /// Sender with the given configuration
    pub fn with_config(config: MockSenderConfig) -> Self {
        Self {
            config,
            sent: Mutex::new(Vec::new()),
            events: Mutex::new(None),
        }
    }

    /// Sender failing the given contacts
    pub fn failing(fail_contacts: HashMap<String, SendFailure>) -> Self {
        Self::with_config(MockSenderConfig {
            fail_contacts,
            delay: None,
        })
    }

    /// Sender with a fixed delay per send call
    pub fn with_delay(delay: Duration) -> Self {
        Self::with_config(MockSenderConfig {
            fail_contacts: HashMap::new(),
            delay: Some(delay),
        })
    }

    /// Stream of attempted contacts, emitted per send call (before the
    /// outcome is decided)
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<String> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.events.lock().unwrap() = Some(tx);
        rx
    }

    /// Successfully delivered messages, in send order
    pub fn sent_messages(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// Count of successful deliveries
    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

impl Default for MockSender {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageSender for MockSender {
    fn name(&self) -> &str {
        "mock"
    }

    async fn send(&self, recipient: &Recipient, body: &str) -> Result<(), SendFailure> {
        if let Some(delay) = self.config.delay {
            sleep(delay).await;
        }

        if let Some(tx) = self.events.lock().unwrap().as_ref() {
            let _ = tx.send(recipient.whatsapp.clone());
        }

        if let Some(failure) = self.config.fail_contacts.get(&recipient.whatsapp) {
            return Err(failure.clone());
        }

        self.sent.lock().unwrap().push(SentMessage {
            whatsapp: recipient.whatsapp.clone(),
            body: body.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::FailureKind;

    fn recipient(whatsapp: &str) -> Recipient {
        Recipient {
            id: String::new(),
            name: "Teste".into(),
            whatsapp: whatsapp.into(),
            plan: None,
            email: None,
        }
    }

    #[tokio::test]
    async fn test_records_successful_sends() {
        let sender = MockSender::new();
        sender.send(&recipient("+550001"), "a").await.unwrap();
        sender.send(&recipient("+550002"), "b").await.unwrap();

        let sent = sender.sent_messages();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].whatsapp, "+550001");
        assert_eq!(sent[1].body, "b");
    }

    #[tokio::test]
    async fn test_injected_failure_is_returned_not_recorded() {
        let mut fail = HashMap::new();
        fail.insert("+550001".to_string(), SendFailure::invalid_recipient("bad"));
        let sender = MockSender::failing(fail);

        let err = sender.send(&recipient("+550001"), "a").await.unwrap_err();
        assert_eq!(err.kind, FailureKind::InvalidRecipient);
        assert_eq!(sender.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_event_stream_sees_failures_too() {
        let mut fail = HashMap::new();
        fail.insert("+550001".to_string(), SendFailure::rejected("no"));
        let sender = MockSender::failing(fail);
        let mut events = sender.subscribe();

        let _ = sender.send(&recipient("+550001"), "a").await;
        sender.send(&recipient("+550002"), "b").await.unwrap();

        assert_eq!(events.recv().await.unwrap(), "+550001");
        assert_eq!(events.recv().await.unwrap(), "+550002");
    }
}
