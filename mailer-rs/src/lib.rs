//! mailer-rs: send one templated email via SMTP or the Gmail API
//!
//! A small integration layer: read credentials from the environment,
//! authenticate, render a plaintext template and hand the message to a
//! transport.
//!
//! # Features
//!
//! - **Templates**: `{{name}}` substitution from any `Serialize` value
//! - **SMTP**: PLAIN authentication with opportunistic STARTTLS
//! - **Gmail API**: OAuth2 authorization code flow with PKCE, split into
//!   a URL-issuing phase and a callback phase
//!
//! # Example
//!
//! ```no_run
//! use mailer_rs::config::SmtpSettings;
//! use mailer_rs::mailer::{Email, Mailer};
//! use mailer_rs::message::SubjectLine;
//! use mailer_rs::templates::TemplateRenderer;
//! use mailer_rs::transport::SmtpTransport;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let transport = SmtpTransport::new(SmtpSettings {
//!         host: "smtp.example.com".to_string(),
//!         port: 587,
//!         from: "sender@example.com".to_string(),
//!         password: "secret".to_string(),
//!     })?;
//!     let mailer = Mailer::new(TemplateRenderer::new("email_templates"), Box::new(transport));
//!
//!     mailer
//!         .send(&Email {
//!             to: "rcpt@example.com",
//!             from: Some("sender@example.com"),
//!             subject: SubjectLine::Literal("Test Email".to_string()),
//!             template: "sample_template.txt",
//!             data: &serde_json::json!({"receiver_name": "Ada", "sender_name": "Charles"}),
//!         })
//!         .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration and the `EMAIL_*` environment
//! - [`error`]: Error types and handling
//! - [`templates`]: Template rendering
//! - [`message`]: Message composition
//! - [`transport`]: SMTP and Gmail delivery
//! - [`oauth`]: Gmail authorization handshake
//! - [`callback`]: HTTP endpoint completing the authorization
//! - [`mailer`]: Render + compose + dispatch
//! - [`cli`]: Command-line entry point

pub mod callback;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod mailer;
pub mod message;
pub mod oauth;
pub mod templates;
pub mod transport;

// Re-export commonly used types
pub use config::Config;
pub use error::{MailerError, Result};
