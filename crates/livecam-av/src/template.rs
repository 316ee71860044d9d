//! Placeholder substitution for command templates.

use std::collections::HashMap;

/// Variable substitution context for command templates.
///
/// Placeholders use the `{{name}}` syntax, with optional whitespace inside the
/// braces. Placeholders without a value render as the empty string. Values are
/// inserted verbatim and never re-scanned for placeholders.
///
/// # Example
///
/// ```
/// use livecam_av::TemplateContext;
///
/// let ctx = TemplateContext::new()
///     .with_var("ffmpeg_file", "ffmpeg")
///     .with_var("output_file", "rtmp://r/app/abc");
///
/// assert_eq!(
///     ctx.render("{{ffmpeg_file}} -f flv {{ output_file }}"),
///     "ffmpeg -f flv rtmp://r/app/abc"
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    vars: HashMap<String, String>,
}

impl TemplateContext {
    /// Create a new empty template context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variable.
    pub fn with_var(mut self, key: &str, value: impl Into<String>) -> Self {
        self.vars.insert(key.to_string(), value.into());
        self
    }

    /// Set a variable.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.vars.insert(key.to_string(), value.into());
    }

    /// Get a variable value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(|s| s.as_str())
    }

    /// Substitute every placeholder in `template`.
    pub fn render(&self, template: &str) -> String {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(open) = rest.find("{{") {
            out.push_str(&rest[..open]);
            let after = &rest[open + 2..];
            match after.find("}}") {
                Some(close) => {
                    let name = after[..close].trim();
                    if let Some(value) = self.vars.get(name) {
                        out.push_str(value);
                    }
                    rest = &after[close + 2..];
                }
                None => {
                    // Unterminated tag: keep the remainder literally.
                    out.push_str(&rest[open..]);
                    rest = "";
                }
            }
        }
        out.push_str(rest);
        out
    }
}
