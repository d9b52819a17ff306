// ABOUTME: Placeholder substitution with mandatory HTML escaping
// ABOUTME: Writes resolved scalar values into the output; missing paths render as nothing

use std::borrow::Cow;
use tracing::debug;

use super::format::display_resolved;
use super::path::{PathExpr, Resolved, Scope};

fn needs_escape(ch: char) -> bool {
    matches!(ch, '&' | '<' | '>' | '"' | '\'' | '`' | '=')
}

/// Escape text for HTML element content and quoted attribute values.
/// Non-ASCII characters pass through unchanged.
pub fn escape_html(input: &str) -> Cow<'_, str> {
    if !input.contains(needs_escape) {
        return Cow::Borrowed(input);
    }
    let mut out = String::with_capacity(input.len() + 16);
    push_escaped(&mut out, input);
    Cow::Owned(out)
}

pub fn push_escaped(out: &mut String, input: &str) {
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '`' => out.push_str("&#x60;"),
            '=' => out.push_str("&#x3D;"),
            _ => out.push(ch),
        }
    }
}

/// Write the escaped value of one placeholder.
///
/// Returns `false` when the path does not resolve. Paths that resolve to an
/// object or list count as resolved but write nothing.
pub fn substitute(out: &mut String, scope: &Scope<'_>, path: &PathExpr<'_>) -> bool {
    let resolved = scope.resolve(path);
    if resolved == Resolved::Missing {
        return false;
    }

    match display_resolved(resolved) {
        Some(text) => push_escaped(out, &text),
        None => debug!("Placeholder '{}' is not a scalar value, rendering empty", path),
    }
    true
}
