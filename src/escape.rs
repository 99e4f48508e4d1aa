//! Quoting of raw text for TriG string literals.

use std::borrow::Cow;
use std::fmt::Write;

/// Escape `raw` so it can be placed between double quotes in a TriG/Turtle
/// short string literal.
///
/// Backslashes are escaped before quotes in a single left-to-right pass, so
/// no character is ever escaped twice. Line breaks and tabs use their short
/// escapes and the remaining control characters are written as `\uXXXX`.
/// Text that needs no escaping is returned borrowed.
///
/// ```
/// use trig_export::escape::escape_literal;
///
/// assert_eq!(escape_literal(r#"AC\DC "live""#), r#"AC\\DC \"live\""#);
/// assert_eq!(escape_literal("Björk"), "Björk");
/// ```
#[must_use]
pub fn escape_literal(raw: &str) -> Cow<'_, str> {
    let Some(first) = raw.find(needs_escape) else {
        return Cow::Borrowed(raw);
    };

    let mut out = String::with_capacity(raw.len() + 8);
    out.push_str(&raw[..first]);
    for ch in raw[first..].chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            ch if needs_escape(ch) => {
                let _ = write!(out, "\\u{:04X}", ch as u32);
            }
            ch => out.push(ch),
        }
    }
    Cow::Owned(out)
}

fn needs_escape(ch: char) -> bool {
    matches!(ch, '\\' | '"') || ch <= '\u{1F}' || ch == '\u{7F}'
}

/// Append `raw` as a complete quoted literal (`"..."`) to `out`.
pub fn push_literal(out: &mut String, raw: &str) {
    out.push('"');
    out.push_str(&escape_literal(raw));
    out.push('"');
}
