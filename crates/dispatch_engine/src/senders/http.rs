//! HttpSender - WhatsApp gateway over HTTP
//!
//! POSTs one JSON message per send call. The gateway contract is the
//! common community-gateway shape: `{ "number": ..., "text": ... }` with
//! an optional bearer token. Non-2xx answers map onto the closed failure
//! taxonomy; the request timeout lives here, not in the worker.

use std::time::Duration;

use contracts::{MessageSender, Recipient, SendFailure};
use reqwest::StatusCode;
use tracing::{debug, instrument};

use crate::error::EngineError;

/// Configuration for HttpSender
#[derive(Debug, Clone)]
pub struct HttpSenderConfig {
    /// Gateway endpoint URL
    pub url: String,
    /// Bearer token, if the gateway requires one
    pub token: Option<String>,
    /// Per-send request timeout
    pub timeout: Duration,
}

impl HttpSenderConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: None,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Sender that delivers through an HTTP WhatsApp gateway
pub struct HttpSender {
    name: String,
    config: HttpSenderConfig,
    client: reqwest::Client,
}

impl HttpSender {
    /// Create a new HttpSender
    pub fn new(config: HttpSenderConfig) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| EngineError::sender_creation("whatsapp_http", e.to_string()))?;

        debug!(url = %config.url, timeout_ms = config.timeout.as_millis() as u64, "HttpSender ready");

        Ok(Self {
            name: "whatsapp_http".to_string(),
            config,
            client,
        })
    }
}

impl MessageSender for HttpSender {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "http_sender_send",
        skip(self, recipient, body),
        fields(sender = %self.name, recipient = %recipient.whatsapp)
    )]
    async fn send(&self, recipient: &Recipient, body: &str) -> Result<(), SendFailure> {
        let payload = serde_json::json!({
            "number": recipient.whatsapp,
            "text": body,
        });

        let mut request = self.client.post(&self.config.url).json(&payload);
        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => return Err(SendFailure::timeout(e.to_string())),
            Err(e) => return Err(SendFailure::internal(e.to_string())),
        };

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let mut detail = response.text().await.unwrap_or_default();
        detail.truncate(200);

        if status == StatusCode::BAD_REQUEST || status == StatusCode::NOT_FOUND {
            Err(SendFailure::invalid_recipient(format!("{status}: {detail}")))
        } else {
            Err(SendFailure::rejected(format!("{status}: {detail}")))
        }
    }
}
