//! Gmail REST API transport (`users.messages.send`)

use crate::error::{MailerError, Result};
use crate::message::ComposedMessage;
use crate::oauth::StoredToken;
use crate::transport::MailTransport;
use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

pub const DEFAULT_API_BASE_URL: &str = "https://gmail.googleapis.com";

/// Request body of `users.messages.send`
#[derive(Debug, Serialize, Deserialize)]
pub struct RawMessage {
    pub raw: String,
}

impl RawMessage {
    pub fn encode(message: &ComposedMessage) -> Self {
        Self {
            raw: URL_SAFE.encode(message.to_bytes()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    id: Option<String>,
}

/// Sends through the authenticated user's mailbox (`me`)
pub struct GmailTransport {
    http: reqwest::Client,
    access_token: String,
    api_base_url: String,
}

impl GmailTransport {
    pub fn new(token: &StoredToken) -> Self {
        Self::with_base_url(token, DEFAULT_API_BASE_URL)
    }

    /// Point the transport at another API root (e.g. a local stand-in)
    pub fn with_base_url(token: &StoredToken, api_base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            access_token: token.access_token.clone(),
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
        }
    }

    fn send_url(&self) -> String {
        format!("{}/gmail/v1/users/me/messages/send", self.api_base_url)
    }
}

#[async_trait]
impl MailTransport for GmailTransport {
    fn name(&self) -> &'static str {
        "OAUTH"
    }

    async fn send(&self, message: &ComposedMessage) -> Result<()> {
        let url = self.send_url();
        debug!("POST {}", url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&RawMessage::encode(message))
            .send()
            .await
            .map_err(|e| {
                error!("Gmail request failed: {}", e);
                MailerError::Delivery(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Gmail rejected message: HTTP {} {}", status, body);
            return Err(match status {
                reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
                    MailerError::Authentication(format!("HTTP {}: {}", status, body))
                }
                _ => MailerError::Delivery(format!("HTTP {}: {}", status, body)),
            });
        }

        let sent: SentMessage = response
            .json()
            .await
            .map_err(|e| MailerError::Delivery(format!("unreadable Gmail response: {}", e)))?;
        info!(
            "Message sent to {} (id {})",
            message.to(),
            sent.id.as_deref().unwrap_or("unknown")
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token() -> StoredToken {
        StoredToken {
            access_token: "ya29.test".to_string(),
            token_type: "Bearer".to_string(),
            refresh_token: None,
            expiry: None,
        }
    }

    #[test]
    fn test_raw_message_is_base64url() {
        let message = ComposedMessage::new("rcpt@example.com", "Subject?", "???>>>");
        let encoded = RawMessage::encode(&message);

        assert!(!encoded.raw.contains('+'));
        assert!(!encoded.raw.contains('/'));
        let decoded = URL_SAFE.decode(&encoded.raw).unwrap();
        assert_eq!(decoded, message.to_bytes());
    }

    #[test]
    fn test_send_url() {
        let transport = GmailTransport::with_base_url(&token(), "http://127.0.0.1:9999/");
        assert_eq!(
            transport.send_url(),
            "http://127.0.0.1:9999/gmail/v1/users/me/messages/send"
        );
        assert_eq!(GmailTransport::new(&token()).api_base_url, DEFAULT_API_BASE_URL);
    }
}
