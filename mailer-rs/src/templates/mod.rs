//! Plaintext email templates
//!
//! Templates live as files in a single directory and are rendered with
//! `{{name}}` variable substitution against any serializable value.

pub mod renderer;

pub use renderer::TemplateRenderer;
