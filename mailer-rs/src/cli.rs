//! Command-line entry point

use crate::config::{Config, EmailEnv, DEFAULT_CONFIG_PATH};
use crate::error::Result;
use crate::mailer::{Email, Mailer};
use crate::message::SubjectLine;
use crate::oauth::OAuthFlow;
use crate::templates::TemplateRenderer;
use crate::transport::{GmailTransport, MailTransport, SmtpTransport};
use clap::Parser;
use serde::Serialize;
use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::info;

/// Exit status for a missing or unknown method
pub const EXIT_USAGE: i32 = 1;

pub const USAGE: &str = "Please add SMTP or OAUTH as the first argument\n\
                         Example: mailer-rs SMTP or mailer-rs OAUTH";

/// Delivery method selected on the command line (case-sensitive)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Smtp,
    OAuth,
}

impl FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "SMTP" => Ok(Method::Smtp),
            "OAUTH" => Ok(Method::OAuth),
            other => Err(format!("unknown method {:?}, expected SMTP or OAUTH", other)),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Method::Smtp => "SMTP",
            Method::OAuth => "OAUTH",
        })
    }
}

#[derive(Debug, Parser)]
#[command(name = "mailer-rs", version, about = "Send a templated email via SMTP or the Gmail API")]
pub struct Cli {
    /// Delivery method: SMTP or OAUTH
    #[arg(value_parser = Method::from_str)]
    pub method: Method,

    /// Configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,
}

pub fn parse_args<I, T>(args: I) -> std::result::Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    Cli::try_parse_from(args)
}

/// Data substituted into the sample template
#[derive(Debug, Clone, Serialize)]
pub struct SampleData {
    pub receiver_name: String,
    pub sender_name: String,
}

impl Default for SampleData {
    fn default() -> Self {
        Self {
            receiver_name: "Ada Lovelace".to_string(),
            sender_name: "Charles Babbage".to_string(),
        }
    }
}

/// Build the transport for `method` and send the sample message to `EMAIL_TO`
pub async fn run(method: Method, config: &Config, email_env: &EmailEnv) -> Result<()> {
    let recipient = email_env.recipient()?;

    let (transport, from): (Box<dyn MailTransport>, Option<&str>) = match method {
        Method::Smtp => {
            let transport = SmtpTransport::new(email_env.smtp_settings()?)?;
            (Box::new(transport), email_env.from.as_deref())
        }
        Method::OAuth => {
            let flow = OAuthFlow::from_config(&config.oauth)?;
            let token = flow.access_token()?;
            let transport = GmailTransport::with_base_url(&token, &config.oauth.api_base_url);
            (Box::new(transport), None)
        }
    };

    let subject = match &config.templates.subject_template {
        Some(name) => SubjectLine::Template(name.clone()),
        None => SubjectLine::Literal(config.templates.subject.clone()),
    };

    info!("Sending {} to {} using {}", config.templates.body, recipient, method);

    let mailer = Mailer::new(TemplateRenderer::new(&config.templates.dir), transport);
    mailer
        .send(&Email {
            to: recipient,
            from,
            subject,
            template: &config.templates.body,
            data: &SampleData::default(),
        })
        .await
}
