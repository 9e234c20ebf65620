//! Body rendering.
//!
//! # Responsibilities
//! - Emit a content-type line for recognizable payloads
//! - Truncate bodies to the display budget and report what was cut
//! - Escape non-printable content while keeping text readable
//!
//! # Design Decisions
//! - Bodies are quoted Go-style, then `\n` and `\"` are turned back into a
//!   newline and a double quote so JSON and text read across lines
//! - Anything that is not a printable character is escaped: controls,
//!   format characters, separators other than ASCII space, unassigned code
//!   points and invalid UTF-8 (including a character split by the budget)
//! - Rendering is a pure function of the bytes and the configuration

use std::sync::Arc;

use unicode_general_category::{get_general_category, GeneralCategory};

use crate::config::RenderConfig;
use crate::render::color::{Color, Painter};
use crate::render::sniff::ContentSniffer;

/// Renders captured bodies into transcript lines.
#[derive(Debug, Clone)]
pub struct BodyRenderer {
    max_body: usize,
    painter: Painter,
    sniffer: Arc<dyn ContentSniffer>,
}

impl BodyRenderer {
    pub fn new(config: &RenderConfig, sniffer: Arc<dyn ContentSniffer>) -> Self {
        Self {
            max_body: config.max_body,
            painter: Painter::new(config.colors),
            sniffer,
        }
    }

    /// Content-type label followed by a blank line, or nothing for empty
    /// and unclassifiable bodies.
    pub fn content_type_lines(&self, body: &[u8], color: Color) -> Vec<String> {
        if body.is_empty() {
            return Vec::new();
        }
        match self.sniffer.sniff(body) {
            Some(label) => vec![self.painter.text(color, &label), String::new()],
            None => Vec::new(),
        }
    }

    /// Escaped body text followed by a blank line, or nothing for an empty body.
    pub fn body_lines(&self, body: &[u8]) -> Vec<String> {
        if body.is_empty() {
            return Vec::new();
        }
        vec![render_body(body, self.max_body), String::new()]
    }
}

/// Escape and truncate a body to at most `max_body` bytes of source.
pub fn render_body(body: &[u8], max_body: usize) -> String {
    let (shown, trimmed) = if body.len() > max_body {
        (&body[..max_body], body.len() - max_body)
    } else {
        (body, 0)
    };

    let mut text = escape(shown);
    if trimmed > 0 {
        text.push_str(&format!(" (trimmed {} bytes)", trimmed));
    }
    text.trim().to_string()
}

/// Escape bytes for display, leaving newlines and double quotes literal.
///
/// The un-escaping runs on the quoted text, so a literal backslash followed
/// by `n` in the payload also reads as a line break.
pub fn escape(bytes: &[u8]) -> String {
    quote(bytes).replace("\\n", "\n").replace("\\\"", "\"")
}

/// Quote bytes the way Go's `strconv.Quote` does, without the surrounding quotes.
fn quote(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    let mut rest = bytes;

    loop {
        match std::str::from_utf8(rest) {
            Ok(valid) => {
                quote_str(valid, &mut out);
                break;
            }
            Err(e) => {
                let (valid, after) = rest.split_at(e.valid_up_to());
                quote_str(std::str::from_utf8(valid).unwrap_or_default(), &mut out);
                let bad = e.error_len().unwrap_or(after.len());
                for b in &after[..bad] {
                    out.push_str(&format!("\\x{:02x}", b));
                }
                rest = &after[bad..];
            }
        }
    }
    out
}

fn quote_str(s: &str, out: &mut String) {
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\x07' => out.push_str("\\a"),
            '\x08' => out.push_str("\\b"),
            '\x0c' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\x0b' => out.push_str("\\v"),
            c if !is_printable(c) => {
                let code = c as u32;
                if code < 0x80 {
                    out.push_str(&format!("\\x{:02x}", code));
                } else if code < 0x1_0000 {
                    out.push_str(&format!("\\u{:04x}", code));
                } else {
                    out.push_str(&format!("\\U{:08x}", code));
                }
            }
            c => out.push(c),
        }
    }
}

/// Letters, marks, numbers, punctuation, symbols and the ASCII space.
fn is_printable(c: char) -> bool {
    if c == ' ' {
        return true;
    }
    !matches!(
        get_general_category(c),
        GeneralCategory::Control
            | GeneralCategory::Format
            | GeneralCategory::Surrogate
            | GeneralCategory::PrivateUse
            | GeneralCategory::Unassigned
            | GeneralCategory::SpaceSeparator
            | GeneralCategory::LineSeparator
            | GeneralCategory::ParagraphSeparator
    )
}
