//! Plaintext message composition (RFC 5322)

use crate::error::Result;
use crate::templates::TemplateRenderer;
use serde::Serialize;
use std::fmt;

const MIME_HEADERS: &str = "MIME-Version: 1.0\r\nContent-Type: text/plain; charset=\"UTF-8\"\r\n";

/// Where the subject line comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubjectLine {
    /// Used verbatim
    Literal(String),
    /// Rendered from a template file against the message data
    Template(String),
}

impl SubjectLine {
    /// Produce the final subject text
    pub fn resolve<T: Serialize + ?Sized>(&self, renderer: &TemplateRenderer, data: &T) -> Result<String> {
        match self {
            SubjectLine::Literal(subject) => Ok(subject.clone()),
            SubjectLine::Template(name) => Ok(renderer.render(name, data)?.trim().to_string()),
        }
    }
}

/// A single text/plain message ready to hand to a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedMessage {
    from: Option<String>,
    to: String,
    subject: String,
    body: String,
}

impl ComposedMessage {
    pub fn new(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            from: None,
            to: header_value(&to.into()),
            subject: header_value(&subject.into()),
            body: body.into(),
        }
    }

    /// Add a `From` header
    pub fn with_from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(header_value(&from.into()));
        self
    }

    pub fn from(&self) -> Option<&str> {
        self.from.as_deref()
    }

    pub fn to(&self) -> &str {
        &self.to
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Wire form: headers, one blank line, CRLF-normalized body
    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }
}

impl fmt::Display for ComposedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(from) = &self.from {
            write!(f, "From: {}\r\n", from)?;
        }
        write!(f, "To: {}\r\n", self.to)?;
        write!(f, "Subject: {}\r\n", self.subject)?;
        f.write_str(MIME_HEADERS)?;
        f.write_str("\r\n")?;
        f.write_str(&normalize_line_endings(&self.body))
    }
}

/// Header values must stay on one line
fn header_value(value: &str) -> String {
    value
        .split(['\r', '\n'])
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

fn normalize_line_endings(body: &str) -> String {
    body.replace("\r\n", "\n").replace('\n', "\r\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_block(raw: &str) -> &str {
        raw.split_once("\r\n\r\n").map(|(headers, _)| headers).unwrap()
    }

    #[test]
    fn test_message_layout() {
        let message = ComposedMessage::new("rcpt@example.com", "Test Email", "Hello\nWorld\n")
            .with_from("sender@example.com");

        assert_eq!(
            message.to_string(),
            "From: sender@example.com\r\n\
             To: rcpt@example.com\r\n\
             Subject: Test Email\r\n\
             MIME-Version: 1.0\r\n\
             Content-Type: text/plain; charset=\"UTF-8\"\r\n\
             \r\n\
             Hello\r\nWorld\r\n"
        );
    }

    #[test]
    fn test_single_to_and_subject_lines() {
        let message = ComposedMessage::new(
            "rcpt@example.com\r\nBcc: evil@example.com",
            "Hi\nTo: other@example.com",
            "To: not-a-header\r\n\r\nSubject: body text",
        );
        let raw = message.to_string();
        let headers = header_block(&raw);

        assert_eq!(headers.lines().filter(|l| l.starts_with("To:")).count(), 1);
        assert_eq!(headers.lines().filter(|l| l.starts_with("Subject:")).count(), 1);
        assert!(!headers.contains("\r\nBcc:"));
        assert_eq!(message.to(), "rcpt@example.com Bcc: evil@example.com");
        assert!(raw.ends_with("To: not-a-header\r\n\r\nSubject: body text"));
    }

    #[test]
    fn test_no_from_header_by_default() {
        let raw = ComposedMessage::new("a@example.com", "s", "b").to_string();
        assert!(raw.starts_with("To: a@example.com\r\n"));
        assert!(!raw.contains("From:"));
    }

    #[test]
    fn test_literal_subject() {
        let renderer = TemplateRenderer::new("unused");
        let subject = SubjectLine::Literal("Weekly report".to_string())
            .resolve(&renderer, &serde_json::json!({}))
            .unwrap();
        assert_eq!(subject, "Weekly report");
    }

    #[test]
    fn test_template_subject() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("subject.txt"), "Hello {{receiver_name}}\n").unwrap();
        let renderer = TemplateRenderer::new(dir.path());

        let subject = SubjectLine::Template("subject.txt".to_string())
            .resolve(&renderer, &serde_json::json!({"receiver_name": "Ada"}))
            .unwrap();
        assert_eq!(subject, "Hello Ada");
    }
}
