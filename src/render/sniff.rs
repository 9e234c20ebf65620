//! Content-type sniffing.
//!
//! # Responsibilities
//! - Classify a body prefix into a media-type label
//! - Report "unknown binary" as `None` so the transcript stays quiet
//!
//! # Design Decisions
//! - Classification looks at a bounded prefix only
//! - Binary formats are recognized by a fixed table of leading signatures
//! - JSON is accepted when the prefix parses, or when it is a valid document
//!   cut short by the sample limit

use serde::de::IgnoredAny;

/// Bytes inspected when classifying a body.
pub const SNIFF_LIMIT: usize = 3072;

/// Maps a byte prefix to a content-type label.
pub trait ContentSniffer: Send + Sync + std::fmt::Debug {
    /// Returns `None` when the content is opaque binary.
    fn sniff(&self, prefix: &[u8]) -> Option<String>;
}

/// Default sniffer combining magic numbers with text heuristics.
#[derive(Debug, Clone, Copy, Default)]
pub struct MagicSniffer;

impl ContentSniffer for MagicSniffer {
    fn sniff(&self, prefix: &[u8]) -> Option<String> {
        let sample = &prefix[..prefix.len().min(SNIFF_LIMIT)];
        if sample.is_empty() {
            return None;
        }

        if let Some(mime) = magic_type(sample) {
            return Some(mime.to_string());
        }

        let truncated = prefix.len() > sample.len();
        let text = match std::str::from_utf8(sample) {
            Ok(text) => text,
            // A sample cut inside a multi-byte sequence is still text.
            Err(e) if truncated && e.error_len().is_none() => {
                std::str::from_utf8(&sample[..e.valid_up_to()]).ok()?
            }
            Err(_) => return None,
        };

        if is_json(text, truncated) {
            return Some("application/json".to_string());
        }
        if let Some(markup) = markup_type(text) {
            return Some(markup.to_string());
        }
        if text.chars().all(|c| !c.is_control() || c.is_ascii_whitespace()) {
            return Some("text/plain; charset=utf-8".to_string());
        }
        None
    }
}

/// A leading byte pattern. `None` entries match any byte.
struct Signature {
    pattern: &'static [Option<u8>],
    mime: &'static str,
}

macro_rules! sig {
    (@byte _) => { None };
    (@byte $b:expr) => { Some($b) };
    ($mime:expr, [$($b:tt),* $(,)?]) => {
        Signature {
            pattern: &[$(sig!(@byte $b)),*],
            mime: $mime,
        }
    };
}

const SIGNATURES: &[Signature] = &[
    sig!("image/png", [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]),
    sig!("image/jpeg", [0xFF, 0xD8, 0xFF]),
    sig!("image/gif", [b'G', b'I', b'F', b'8', b'7', b'a']),
    sig!("image/gif", [b'G', b'I', b'F', b'8', b'9', b'a']),
    sig!("image/bmp", [b'B', b'M']),
    sig!("image/webp", [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', b'V', b'P']),
    sig!("image/x-icon", [0x00, 0x00, 0x01, 0x00]),
    sig!("application/pdf", [b'%', b'P', b'D', b'F', b'-']),
    sig!("application/postscript", [b'%', b'!', b'P', b'S', b'-', b'A', b'd', b'o', b'b', b'e', b'-']),
    sig!("application/x-gzip", [0x1F, 0x8B, 0x08]),
    sig!("application/zip", [b'P', b'K', 0x03, 0x04]),
    sig!("application/x-rar-compressed", [b'R', b'a', b'r', b'!', 0x1A, 0x07]),
    sig!("application/x-7z-compressed", [b'7', b'z', 0xBC, 0xAF, 0x27, 0x1C]),
    sig!("application/wasm", [0x00, b'a', b's', b'm']),
    sig!("application/ogg", [b'O', b'g', b'g', b'S', 0x00]),
    sig!("audio/wave", [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'A', b'V', b'E']),
    sig!("video/avi", [b'R', b'I', b'F', b'F', _, _, _, _, b'A', b'V', b'I', b' ']),
    sig!("audio/mpeg", [b'I', b'D', b'3']),
    sig!("video/mp4", [_, _, _, _, b'f', b't', b'y', b'p']),
    sig!("video/webm", [0x1A, 0x45, 0xDF, 0xA3]),
    sig!("font/woff", [b'w', b'O', b'F', b'F']),
    sig!("font/woff2", [b'w', b'O', b'F', b'2']),
    sig!("font/ttf", [0x00, 0x01, 0x00, 0x00]),
    sig!("font/otf", [b'O', b'T', b'T', b'O']),
];

fn magic_type(sample: &[u8]) -> Option<&'static str> {
    SIGNATURES
        .iter()
        .find(|sig| {
            sample.len() >= sig.pattern.len()
                && sig
                    .pattern
                    .iter()
                    .zip(sample)
                    .all(|(expected, actual)| expected.map_or(true, |b| b == *actual))
        })
        .map(|sig| sig.mime)
}

fn is_json(text: &str, truncated: bool) -> bool {
    let trimmed = text.trim_start();
    if !(trimmed.starts_with('{') || trimmed.starts_with('[')) {
        return false;
    }
    match serde_json::from_str::<IgnoredAny>(trimmed) {
        Ok(_) => true,
        Err(e) => truncated && e.is_eof(),
    }
}

fn markup_type(text: &str) -> Option<&'static str> {
    let head = text.trim_start();
    let lower = head
        .get(..head.len().min(64))
        .unwrap_or(head)
        .to_ascii_lowercase();

    if lower.starts_with("<?xml") {
        if head.contains("<svg") {
            return Some("image/svg+xml");
        }
        return Some("text/xml; charset=utf-8");
    }
    const HTML_PREFIXES: [&str; 7] = [
        "<!doctype html",
        "<html",
        "<head",
        "<body",
        "<script",
        "<title",
        "<!--",
    ];
    if HTML_PREFIXES.iter().any(|p| lower.starts_with(p)) {
        return Some("text/html; charset=utf-8");
    }
    if lower.starts_with("<svg") {
        return Some("image/svg+xml");
    }
    None
}
