//! Message delivery
//!
//! - [`smtp`]: plain-credential SMTP submission
//! - [`gmail`]: Gmail REST API with an OAuth2 bearer token

pub mod gmail;
pub mod smtp;

use crate::error::Result;
use crate::message::ComposedMessage;
use async_trait::async_trait;

pub use gmail::GmailTransport;
pub use smtp::SmtpTransport;

/// A delivery mechanism for a composed message
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Submit one message. Failures are returned as-is, nothing is retried.
    async fn send(&self, message: &ComposedMessage) -> Result<()>;
}
