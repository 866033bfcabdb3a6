//! Render, compose and dispatch one message

use crate::error::Result;
use crate::message::{ComposedMessage, SubjectLine};
use crate::templates::TemplateRenderer;
use crate::transport::MailTransport;
use serde::Serialize;
use tracing::{error, info};

/// What to send
pub struct Email<'a, T: Serialize + ?Sized> {
    pub to: &'a str,
    pub from: Option<&'a str>,
    pub subject: SubjectLine,
    pub template: &'a str,
    pub data: &'a T,
}

/// Sends templated messages through one transport
pub struct Mailer {
    renderer: TemplateRenderer,
    transport: Box<dyn MailTransport>,
}

impl Mailer {
    pub fn new(renderer: TemplateRenderer, transport: Box<dyn MailTransport>) -> Self {
        Self {
            renderer,
            transport,
        }
    }

    pub fn transport_name(&self) -> &'static str {
        self.transport.name()
    }

    /// Render the body and subject, then build the message
    pub fn compose<T: Serialize + ?Sized>(&self, email: &Email<'_, T>) -> Result<ComposedMessage> {
        let body = self.renderer.render(email.template, email.data)?;
        let subject = email.subject.resolve(&self.renderer, email.data)?;

        let message = ComposedMessage::new(email.to, subject, body);
        Ok(match email.from {
            Some(from) => message.with_from(from),
            None => message,
        })
    }

    /// Render, compose and hand the message to the transport
    pub async fn send<T: Serialize + ?Sized>(&self, email: &Email<'_, T>) -> Result<()> {
        let message = self.compose(email).map_err(|e| {
            error!("Unable to prepare message for {}: {}", email.to, e);
            e
        })?;

        match self.transport.send(&message).await {
            Ok(()) => {
                info!("Email sent successfully using {}", self.transport.name());
                Ok(())
            }
            Err(e) => {
                error!("{} delivery failed: {}", self.transport.name(), e);
                Err(e)
            }
        }
    }
}
