//! Caption text encoding for the render request.

use base64::{engine::general_purpose, Engine as _};
use regex::Regex;
use std::sync::LazyLock;
use tracing::trace;

/// Column width the renderer lays caption lines out at.
pub const WRAP_WIDTH: usize = 28;

/// Up to `WRAP_WIDTH` characters followed by the whitespace run after them,
/// or failing that the next whole word. Long words are never split.
static LINE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"[^\n]{{1,{WRAP_WIDTH}}}([\s\x{{200B}}]+|$)|[^\s\x{{200B}}]+?([\s\x{{200B}}]+|$)"
    ))
    .expect("invalid line pattern")
});

/// Greedily wrap `text` at `WRAP_WIDTH` columns, joining lines with `\n`.
/// Trailing spaces stay on the line they follow.
pub fn wrap(text: &str) -> String {
    LINE_PATTERN
        .find_iter(text)
        .map(|m| m.as_str().strip_suffix('\n').unwrap_or(m.as_str()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Turn caption text into the `b64lines` query value.
/// The way this works is by wrapping the text, base64 encoding the UTF-8
/// bytes and swapping `/` for `_` and `+` for `-` (padding is kept).
pub fn encode(text: &str) -> String {
    let wrapped = wrap(text);
    trace!("encode wrapped={:?}", wrapped);
    general_purpose::URL_SAFE.encode(wrapped.as_bytes())
}
