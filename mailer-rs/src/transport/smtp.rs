//! SMTP submission with PLAIN authentication
//!
//! The protocol exchange itself is handled by `lettre`. STARTTLS is used when
//! the server offers it; port 465 gets implicit TLS.

use crate::config::SmtpSettings;
use crate::error::{MailerError, Result};
use crate::message::ComposedMessage;
use crate::transport::MailTransport;
use async_trait::async_trait;
use lettre::address::{Address, Envelope};
use lettre::transport::smtp::authentication::{Credentials, Mechanism};
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use tracing::{error, info};

const IMPLICIT_TLS_PORT: u16 = 465;

/// SMTP transport authenticating as the sender
///
/// # Examples
/// ```no_run
/// use mailer_rs::config::SmtpSettings;
/// use mailer_rs::message::ComposedMessage;
/// use mailer_rs::transport::{MailTransport, SmtpTransport};
///
/// # async fn example() -> mailer_rs::Result<()> {
/// let transport = SmtpTransport::new(SmtpSettings {
///     host: "smtp.example.com".to_string(),
///     port: 587,
///     from: "sender@example.com".to_string(),
///     password: "secret".to_string(),
/// })?;
/// transport
///     .send(&ComposedMessage::new("rcpt@example.com", "Hi", "Hello!"))
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct SmtpTransport {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Address,
    server_addr: String,
}

impl SmtpTransport {
    /// Build the transport. No connection is made until [`MailTransport::send`].
    pub fn new(settings: SmtpSettings) -> Result<Self> {
        let from: Address = settings
            .from
            .parse()
            .map_err(|e| MailerError::Config(format!("invalid EMAIL_FROM {}: {}", settings.from, e)))?;

        let tls_parameters = TlsParameters::new(settings.host.clone())
            .map_err(|e| MailerError::Config(format!("invalid TLS parameters: {}", e)))?;
        let tls = if settings.port == IMPLICIT_TLS_PORT {
            Tls::Wrapper(tls_parameters)
        } else {
            Tls::Opportunistic(tls_parameters)
        };

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(settings.host.as_str())
            .port(settings.port)
            .tls(tls)
            .credentials(Credentials::new(settings.from.clone(), settings.password))
            .authentication(vec![Mechanism::Plain])
            .build();

        Ok(Self {
            mailer,
            from,
            server_addr: format!("{}:{}", settings.host, settings.port),
        })
    }

    fn envelope(&self, message: &ComposedMessage) -> Result<Envelope> {
        let to: Address = message
            .to()
            .parse()
            .map_err(|e| MailerError::Delivery(format!("invalid recipient {}: {}", message.to(), e)))?;

        Envelope::new(Some(self.from.clone()), vec![to])
            .map_err(|e| MailerError::Delivery(format!("invalid envelope: {}", e)))
    }
}

#[async_trait]
impl MailTransport for SmtpTransport {
    fn name(&self) -> &'static str {
        "SMTP"
    }

    async fn send(&self, message: &ComposedMessage) -> Result<()> {
        info!("Sending mail from {} to {} via {}", self.from, message.to(), self.server_addr);

        let envelope = self.envelope(message)?;
        match self.mailer.send_raw(&envelope, &message.to_bytes()).await {
            Ok(response) => {
                info!("Mail accepted by {}: {}", self.server_addr, response.code());
                Ok(())
            }
            Err(e) => {
                error!("SMTP delivery to {} failed: {}", self.server_addr, e);
                Err(MailerError::Delivery(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(host: &str, port: u16) -> SmtpSettings {
        SmtpSettings {
            host: host.to_string(),
            port,
            from: "sender@example.com".to_string(),
            password: "secret".to_string(),
        }
    }

    #[test]
    fn test_transport_creation() {
        let transport = SmtpTransport::new(settings("mail.example.com", 587)).unwrap();
        assert_eq!(transport.server_addr, "mail.example.com:587");
        assert_eq!(transport.name(), "SMTP");
    }

    #[test]
    fn test_invalid_sender_rejected() {
        let mut bad = settings("mail.example.com", 587);
        bad.from = "not an address".to_string();
        assert!(matches!(SmtpTransport::new(bad), Err(MailerError::Config(_))));
    }

    #[tokio::test]
    async fn test_invalid_recipient_is_delivery_error() {
        let transport = SmtpTransport::new(settings("127.0.0.1", 1)).unwrap();
        let message = ComposedMessage::new("nobody", "Hi", "Hello");

        assert!(matches!(
            transport.send(&message).await,
            Err(MailerError::Delivery(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_delivery_error() {
        // Bind then drop to get a port nothing listens on
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let transport = SmtpTransport::new(settings("127.0.0.1", port)).unwrap();
        let message = ComposedMessage::new("rcpt@example.com", "Hi", "Hello");

        let result = transport.send(&message).await;
        assert!(matches!(result, Err(MailerError::Delivery(_))));
    }
}
