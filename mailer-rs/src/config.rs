use crate::error::{MailerError, Result};
use crate::transport::gmail::DEFAULT_API_BASE_URL;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default location of the optional configuration file
pub const DEFAULT_CONFIG_PATH: &str = "mailer.toml";

/// Submission port used when `EMAIL_PORT` is not set
pub const DEFAULT_SMTP_PORT: u16 = 587;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub templates: TemplateConfig,
    pub oauth: OAuthConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TemplateConfig {
    pub dir: String,
    pub body: String,
    pub subject: String,
    /// When set, the subject is rendered from this template instead of `subject`
    pub subject_template: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OAuthConfig {
    pub credentials_path: String,
    pub token_path: String,
    pub pending_path: String,
    /// Overrides the first redirect URI found in the client secret file
    pub redirect_uri: Option<String>,
    pub callback_addr: String,
    pub api_base_url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Config {
    /// Load configuration from defaults, `mailer.toml` and `MAILER__*` variables
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration with an explicit file path. A missing file is not an error.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::build(path.as_ref(), None)
    }

    /// Same as [`Config::load_from`] but reads overrides from `env` instead of the process
    pub fn load_with_env<P: AsRef<Path>>(path: P, env: config::Map<String, String>) -> Result<Self> {
        Self::build(path.as_ref(), Some(env))
    }

    fn build(path: &Path, env: Option<config::Map<String, String>>) -> Result<Self> {
        let defaults = Config::default();

        let settings = config::Config::builder()
            .set_default("templates.dir", defaults.templates.dir)?
            .set_default("templates.body", defaults.templates.body)?
            .set_default("templates.subject", defaults.templates.subject)?
            .set_default("oauth.credentials_path", defaults.oauth.credentials_path)?
            .set_default("oauth.token_path", defaults.oauth.token_path)?
            .set_default("oauth.pending_path", defaults.oauth.pending_path)?
            .set_default("oauth.callback_addr", defaults.oauth.callback_addr)?
            .set_default("oauth.api_base_url", defaults.oauth.api_base_url)?
            .set_default("logging.level", defaults.logging.level)?
            .set_default("logging.format", defaults.logging.format)?
            .add_source(config::File::from(path).required(false))
            .add_source(
                config::Environment::with_prefix("MAILER")
                    .prefix_separator("__")
                    .separator("__")
                    .source(env),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            templates: TemplateConfig {
                dir: "email_templates".to_string(),
                body: "sample_template.txt".to_string(),
                subject: "Test Email".to_string(),
                subject_template: None,
            },
            oauth: OAuthConfig {
                credentials_path: "oauth_credentials.json".to_string(),
                token_path: "token.json".to_string(),
                pending_path: "oauth_pending.json".to_string(),
                redirect_uri: None,
                callback_addr: "127.0.0.1:8080".to_string(),
                api_base_url: DEFAULT_API_BASE_URL.to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }
}

/// The `EMAIL_*` environment block
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmailEnv {
    pub host: Option<String>,
    pub from: Option<String>,
    pub password: Option<String>,
    pub port: Option<u16>,
    pub to: Option<String>,
}

/// Credentials and endpoint for SMTP submission
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub from: String,
    pub password: String,
}

impl EmailEnv {
    pub fn from_env() -> Result<Self> {
        Self::from_source(None)
    }

    /// Read the block from `source` instead of the process environment
    pub fn from_source(source: Option<config::Map<String, String>>) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::Environment::with_prefix("EMAIL").source(source))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Recipient address (`EMAIL_TO`)
    pub fn recipient(&self) -> Result<&str> {
        required(&self.to, "EMAIL_TO")
    }

    pub fn smtp_settings(&self) -> Result<SmtpSettings> {
        Ok(SmtpSettings {
            host: required(&self.host, "EMAIL_HOST")?.to_string(),
            port: self.port.unwrap_or(DEFAULT_SMTP_PORT),
            from: required(&self.from, "EMAIL_FROM")?.to_string(),
            password: required(&self.password, "EMAIL_PASSWORD")?.to_string(),
        })
    }
}

fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str> {
    match value.as_deref() {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(MailerError::Config(format!("{} is not set", name))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> config::Map<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_without_file() {
        let config = Config::load_with_env("does-not-exist.toml", env(&[])).unwrap();
        assert_eq!(config.templates.dir, "email_templates");
        assert_eq!(config.templates.body, "sample_template.txt");
        assert_eq!(config.oauth.token_path, "token.json");
        assert_eq!(config.oauth.callback_addr, "127.0.0.1:8080");
        assert_eq!(config.oauth.api_base_url, DEFAULT_API_BASE_URL);
        assert!(config.templates.subject_template.is_none());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_file_and_env_layering() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[templates]\ndir = \"custom\"\nsubject_template = \"subject.txt\"\n\n[logging]\nlevel = \"debug\""
        )
        .unwrap();

        let config = Config::load_with_env(
            file.path(),
            env(&[("MAILER__LOGGING__LEVEL", "trace")]),
        )
        .unwrap();

        assert_eq!(config.templates.dir, "custom");
        assert_eq!(config.templates.subject_template.as_deref(), Some("subject.txt"));
        assert_eq!(config.templates.body, "sample_template.txt");
        assert_eq!(config.logging.level, "trace");
    }

    #[test]
    fn test_email_env_smtp_settings() {
        let email = EmailEnv::from_source(Some(env(&[
            ("EMAIL_HOST", "smtp.example.com"),
            ("EMAIL_FROM", "sender@example.com"),
            ("EMAIL_PASSWORD", "secret"),
            ("EMAIL_PORT", "2525"),
            ("EMAIL_TO", "rcpt@example.com"),
        ])))
        .unwrap();

        let smtp = email.smtp_settings().unwrap();
        assert_eq!(smtp.host, "smtp.example.com");
        assert_eq!(smtp.port, 2525);
        assert_eq!(smtp.from, "sender@example.com");
        assert_eq!(smtp.password, "secret");
        assert_eq!(email.recipient().unwrap(), "rcpt@example.com");
    }

    #[test]
    fn test_written_defaults_load_back() {
        let mut expected = Config::default();
        expected.oauth.callback_addr = "127.0.0.1:9090".to_string();
        expected.logging.format = "json".to_string();

        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(toml::to_string(&expected).unwrap().as_bytes())
            .unwrap();

        let config = Config::load_with_env(file.path(), env(&[])).unwrap();
        assert_eq!(config.oauth.callback_addr, "127.0.0.1:9090");
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.oauth.pending_path, expected.oauth.pending_path);
    }

    #[test]
    fn test_email_env_default_port() {
        let email = EmailEnv::from_source(Some(env(&[
            ("EMAIL_HOST", "smtp.example.com"),
            ("EMAIL_FROM", "sender@example.com"),
            ("EMAIL_PASSWORD", "secret"),
        ])))
        .unwrap();

        assert_eq!(email.smtp_settings().unwrap().port, DEFAULT_SMTP_PORT);
    }

    #[test]
    fn test_email_env_missing_values() {
        let email = EmailEnv::from_source(Some(env(&[("EMAIL_HOST", "smtp.example.com")]))).unwrap();

        match email.smtp_settings() {
            Err(MailerError::Config(msg)) => assert!(msg.contains("EMAIL_FROM")),
            other => panic!("expected config error, got {:?}", other),
        }
        assert!(email.recipient().is_err());
    }
}
