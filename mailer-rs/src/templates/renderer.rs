//! Template rendering with variable substitution

use crate::error::{MailerError, Result};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Renders plaintext templates stored in a directory
///
/// Placeholders use the `{{name}}` syntax; whitespace inside the braces is
/// ignored. Every placeholder must be matched by a field of the data value.
///
/// # Examples
/// ```no_run
/// use mailer_rs::templates::TemplateRenderer;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Greeting { receiver_name: String }
///
/// # fn example() -> mailer_rs::Result<()> {
/// let renderer = TemplateRenderer::new("email_templates");
/// let body = renderer.render(
///     "sample_template.txt",
///     &Greeting { receiver_name: "Ada".to_string() },
/// )?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    dir: PathBuf,
}

impl TemplateRenderer {
    /// Create a renderer rooted at `dir`
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    /// Render the template file `name` against `data`
    ///
    /// # Errors
    /// Returns [`MailerError::Template`] if:
    /// - the name is not a plain relative path inside the template directory
    /// - the file cannot be read
    /// - `data` does not serialize to an object of scalar fields
    /// - a placeholder has no matching field
    pub fn render<T: Serialize + ?Sized>(&self, name: &str, data: &T) -> Result<String> {
        let path = self.template_path(name)?;
        let source = std::fs::read_to_string(&path).map_err(|e| {
            MailerError::Template(format!("unable to read template {}: {}", path.display(), e))
        })?;

        let vars = Self::variables_from(data)?;

        let missing: Vec<String> = Self::extract_variables(&source)
            .into_iter()
            .filter(|name| !vars.contains_key(name))
            .collect();
        if !missing.is_empty() {
            return Err(MailerError::Template(format!(
                "template {} references missing fields: {}",
                name,
                missing.join(", ")
            )));
        }

        debug!("Rendering template {} with {} variables", path.display(), vars.len());
        Ok(Self::render_str(&source, &vars))
    }

    /// Resolve a template name against the template directory
    pub fn template_path(&self, name: &str) -> Result<PathBuf> {
        let relative = Path::new(name);
        let is_plain = !name.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));

        if !is_plain {
            return Err(MailerError::Template(format!("invalid template name: {:?}", name)));
        }

        Ok(self.dir.join(relative))
    }

    /// Substitute every `{{name}}` found in `vars`; unknown placeholders are left untouched
    pub fn render_str(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(start) = rest.find("{{") {
            let after_open = &rest[start + 2..];
            let Some(end) = after_open.find("}}") else {
                break;
            };

            result.push_str(&rest[..start]);
            let name = after_open[..end].trim();
            match vars.get(name) {
                Some(value) => result.push_str(value),
                None => result.push_str(&rest[start..start + 2 + end + 2]),
            }
            rest = &after_open[end + 2..];
        }

        result.push_str(rest);
        result
    }

    /// Extract all variable names from a template string
    ///
    /// Returns a sorted list of unique names (without `{{ }}` markers)
    pub fn extract_variables(template: &str) -> Vec<String> {
        let mut variables = Vec::new();
        let mut rest = template;

        while let Some(start) = rest.find("{{") {
            let after_open = &rest[start + 2..];
            let Some(end) = after_open.find("}}") else {
                break;
            };

            let name = after_open[..end].trim();
            if !name.is_empty() {
                variables.push(name.to_string());
            }
            rest = &after_open[end + 2..];
        }

        variables.sort();
        variables.dedup();
        variables
    }

    /// Flatten `data` into placeholder values
    fn variables_from<T: Serialize + ?Sized>(data: &T) -> Result<HashMap<String, String>> {
        let value = serde_json::to_value(data)
            .map_err(|e| MailerError::Template(format!("unable to serialize template data: {}", e)))?;

        let Value::Object(fields) = value else {
            return Err(MailerError::Template(
                "template data must be a struct or map".to_string(),
            ));
        };

        fields
            .into_iter()
            .map(|(key, value)| {
                let text = match value {
                    Value::String(s) => s,
                    Value::Null => String::new(),
                    Value::Bool(b) => b.to_string(),
                    Value::Number(n) => n.to_string(),
                    Value::Array(_) | Value::Object(_) => {
                        return Err(MailerError::Template(format!(
                            "field {} is not a scalar value",
                            key
                        )))
                    }
                };
                Ok((key, text))
            })
            .collect()
    }
}
