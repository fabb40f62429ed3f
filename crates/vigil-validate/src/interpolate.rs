//! Message template rendering.
//!
//! Templates name parameters in braces: `"size must be between {min} and {max}"`.
//! A placeholder with no matching parameter is kept verbatim. `\{`, `\}` and
//! `\\` produce literal characters.

use crate::params::Params;
use crate::path::PropertyPath;
use crate::value::Value;

/// What an interpolator gets to see about a failure.
#[derive(Debug)]
pub struct MessageContext<'a> {
    /// The constraint kind that failed (e.g. "size")
    pub kind: &'a str,
    /// Effective parameters, defaults included
    pub params: &'a Params,
    /// Where the failing value sits
    pub path: &'a PropertyPath,
    /// The failing value
    pub value: &'a Value<'a>,
}

/// Turns a message template into the text reported to callers.
///
/// Replace the default to plug in translation. Implementations must be
/// pure; the engine calls them concurrently.
pub trait MessageInterpolator: Send + Sync {
    fn interpolate(&self, template: &str, ctx: &MessageContext<'_>) -> String;
}

/// Default interpolator: plain placeholder substitution from the
/// constraint's parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateInterpolator;

impl MessageInterpolator for TemplateInterpolator {
    fn interpolate(&self, template: &str, ctx: &MessageContext<'_>) -> String {
        render(template, ctx.params)
    }
}

/// Render `template` with `params`.
pub fn render(template: &str, params: &Params) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => match chars.peek() {
                Some(&(_, next @ ('{' | '}' | '\\'))) => {
                    out.push(next);
                    chars.next();
                }
                _ => out.push('\\'),
            },
            '{' => {
                let rest = &template[i + 1..];
                match rest.find(['{', '}']) {
                    Some(end) if rest.as_bytes()[end] == b'}' => {
                        let name = &rest[..end];
                        match params.get(name) {
                            Some(value) => out.push_str(&display(value)),
                            None => {
                                out.push('{');
                                out.push_str(name);
                                out.push('}');
                            }
                        }
                        // Skip past the placeholder body and closing brace.
                        for _ in 0..=name.chars().count() {
                            chars.next();
                        }
                    }
                    _ => out.push('{'),
                }
            }
            other => out.push(other),
        }
    }

    out
}

fn display(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Null => "null".to_string(),
        serde_json::Value::Array(items) => items
            .iter()
            .map(display)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}
