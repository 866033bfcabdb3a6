use thiserror::Error;

#[derive(Error, Debug)]
pub enum MailerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Authorization required, visit {auth_url} to grant access")]
    AuthorizationRequired { auth_url: String },

    #[error("Delivery failed: {0}")]
    Delivery(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<config::ConfigError> for MailerError {
    fn from(err: config::ConfigError) -> Self {
        MailerError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MailerError>;
