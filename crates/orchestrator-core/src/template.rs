use std::collections::HashMap;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("missing argument for placeholder '{0}'")]
    MissingArgument(String),
}

/// Substitutes `{name}` placeholders with values from `args`.
///
/// Every placeholder must have a matching key; a placeholder is never
/// silently replaced with an empty string. Text outside placeholders is
/// reproduced verbatim, including `{` sequences that do not form a
/// placeholder.
pub fn render(template: &str, args: &HashMap<String, String>) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match placeholder_name(after) {
            Some(name) => {
                let value = args
                    .get(name)
                    .ok_or_else(|| TemplateError::MissingArgument(name.to_string()))?;
                out.push_str(value);
                rest = &after[name.len() + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    Ok(out)
}

/// Lists the distinct placeholder names in `template`, in order of first
/// appearance.
pub fn placeholders(template: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        match placeholder_name(after) {
            Some(name) => {
                if !names.iter().any(|n| n == name) {
                    names.push(name.to_string());
                }
                rest = &after[name.len() + 1..];
            }
            None => rest = after,
        }
    }

    names
}

// A placeholder name runs to the next '}' and may not be empty, span lines,
// or contain another '{'.
fn placeholder_name(after_open: &str) -> Option<&str> {
    let close = after_open.find('}')?;
    let name = &after_open[..close];
    if name.is_empty() || name.contains('{') || name.contains(char::is_whitespace) {
        return None;
    }
    Some(name)
}
