//! `{field}` substitution for shell command templates.
//!
//! Placeholders are replaced with values from the decoded event. `{{` and
//! `}}` are literal brace escapes. A placeholder whose key is absent from
//! the event is a fatal error for that invocation.

use crate::event::Event;
use serde_json::Value;

/// Failure to render a command template against an event.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("event has no field '{0}'")]
    MissingField(String),
    #[error("unclosed '{{' in template")]
    Unclosed,
    #[error("unmatched '}}' in template")]
    Unmatched,
}

/// Render `template`, substituting each `{key}` placeholder with the
/// corresponding event value.
///
/// String values substitute verbatim; other JSON scalars use their JSON
/// rendering.
///
/// # Errors
///
/// Returns [`TemplateError`] for a placeholder key absent from the event or
/// for unbalanced braces.
pub fn render(template: &str, event: &Event) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '{' => {
                let mut key = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(c) => key.push(c),
                        None => return Err(TemplateError::Unclosed),
                    }
                }
                match event.get(&key) {
                    Some(value) => out.push_str(&scalar_text(value)),
                    None => return Err(TemplateError::MissingField(key)),
                }
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '}' => return Err(TemplateError::Unmatched),
            c => out.push(c),
        }
    }

    Ok(out)
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
