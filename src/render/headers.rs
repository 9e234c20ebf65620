//! Header rendering.
//!
//! # Responsibilities
//! - Merge real headers with injected entries (e.g. `Host`)
//! - Order keys deterministically so transcripts diff cleanly across runs
//! - Hide noisy headers and abbreviate long values in short-header mode
//!
//! # Design Decisions
//! - Keys are shown in canonical MIME form (`content-type` → `Content-Type`)
//! - Values keep their insertion order within a key; only keys are sorted
//! - Non-UTF-8 values are rendered lossily, never rejected

use std::borrow::Cow;
use std::collections::BTreeMap;

use axum::http::HeaderMap;

use crate::config::RenderConfig;
use crate::render::color::{Color, Painter};

/// Headers hidden in short-header mode.
pub const SHORT_HEADER_DENYLIST: [&str; 29] = [
    "Accept",
    "Accept-Encoding",
    "Accept-Language",
    "Access-Control-Allow-Methods",
    "Access-Control-Allow-Origin",
    "Access-Control-Expose-Headers",
    "Access-Control-Max-Age",
    "Cache-Control",
    "Connection",
    "Dnt",
    "Etag",
    "If-None-Match",
    "Origin",
    "Referer",
    "Referrer-Policy",
    "Sec-Fetch-Dest",
    "Sec-Fetch-Mode",
    "Sec-Fetch-Site",
    "Server-Timing",
    "User-Agent",
    "Vary",
    "X-Content-Type-Options",
    "X-Download-Options",
    "X-Forwarded-For",
    "X-Forwarded-Proto",
    "X-Frame-Options",
    "X-Permitted-Cross-Domain-Policies",
    "X-Runtime",
    "X-Xss-Protection",
];

const ELLIPSIS: &str = " ‥ ";

/// Synthetic entries rendered alongside the real header collection.
pub type ExtraHeaders = BTreeMap<String, Vec<String>>;

/// Canonical MIME form of a header name.
pub fn canonical_name(name: &str) -> String {
    let mut upper = true;
    name.chars()
        .map(|c| {
            let out = if upper {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            };
            upper = c == '-';
            out
        })
        .collect()
}

/// Renders header collections into transcript lines.
#[derive(Debug, Clone, Copy)]
pub struct HeaderFormatter {
    short_headers: bool,
    max_header: usize,
    tail: usize,
    painter: Painter,
}

impl HeaderFormatter {
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            short_headers: config.short_headers,
            max_header: config.max_header,
            tail: config.max_header_tail,
            painter: Painter::new(config.colors),
        }
    }

    /// One line per header value, keys in ascending byte order.
    pub fn format(&self, headers: &HeaderMap, extra: &ExtraHeaders, color: Color) -> Vec<String> {
        let mut groups: BTreeMap<String, (Vec<Cow<'_, str>>, Vec<&str>)> = BTreeMap::new();

        for (name, value) in headers {
            groups
                .entry(canonical_name(name.as_str()))
                .or_default()
                .0
                .push(String::from_utf8_lossy(value.as_bytes()));
        }
        for (name, values) in extra {
            groups
                .entry(canonical_name(name))
                .or_default()
                .1
                .extend(values.iter().map(String::as_str));
        }

        let mut lines = Vec::new();
        for (key, (real, injected)) in &groups {
            if self.short_headers && SHORT_HEADER_DENYLIST.contains(&key.as_str()) {
                continue;
            }
            for value in real.iter().map(|v| v.as_ref()).chain(injected.iter().copied()) {
                lines.push(self.line(color, key, value));
            }
        }
        lines
    }

    fn line(&self, color: Color, key: &str, value: &str) -> String {
        let value = self.abbreviate(value);
        format!(
            "{}: {}",
            self.painter.bright(color, key),
            self.painter.text(color, &value)
        )
    }

    /// Shorten a value to head, ellipsis and tail when short-header mode is on.
    pub fn abbreviate<'v>(&self, value: &'v str) -> Cow<'v, str> {
        if !self.short_headers || value.len() <= self.max_header {
            return Cow::Borrowed(value);
        }
        let head_end = floor_char_boundary(value, self.max_header.saturating_sub(self.tail));
        let tail_start = ceil_char_boundary(value, value.len().saturating_sub(self.tail));
        Cow::Owned(format!("{}{}{}", &value[..head_end], ELLIPSIS, &value[tail_start..]))
    }
}

fn floor_char_boundary(s: &str, mut index: usize) -> usize {
    while !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn ceil_char_boundary(s: &str, mut index: usize) -> usize {
    while !s.is_char_boundary(index) {
        index += 1;
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::{HeaderName, HeaderValue};

    fn config(short: bool, colors: bool) -> RenderConfig {
        RenderConfig {
            short_headers: short,
            colors,
            ..RenderConfig::default()
        }
    }

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.append(
                HeaderName::from_bytes(k.as_bytes()).unwrap(),
                HeaderValue::from_str(v).unwrap(),
            );
        }
        map
    }

    fn host(value: &str) -> ExtraHeaders {
        let mut extra = ExtraHeaders::new();
        extra.insert("Host".into(), vec![value.into()]);
        extra
    }

    #[test]
    fn test_canonical_name() {
        assert_eq!(canonical_name("content-type"), "Content-Type");
        assert_eq!(canonical_name("x-xss-protection"), "X-Xss-Protection");
        assert_eq!(canonical_name("DNT"), "Dnt");
        assert_eq!(canonical_name("etag"), "Etag");
    }

    #[test]
    fn test_keys_sorted_with_extras_merged() {
        let map = headers(&[("x-b", "2"), ("accept", "*/*"), ("content-type", "text/plain")]);
        let lines = HeaderFormatter::new(&config(false, false)).format(&map, &host("example.com"), Color::Blue);
        assert_eq!(
            lines,
            vec![
                "Accept: */*",
                "Content-Type: text/plain",
                "Host: example.com",
                "X-B: 2",
            ]
        );
    }

    #[test]
    fn test_values_keep_insertion_order_real_before_extra() {
        let map = headers(&[("host", "real"), ("set-cookie", "z=1"), ("set-cookie", "a=2")]);
        let lines = HeaderFormatter::new(&config(false, false)).format(&map, &host("injected"), Color::Green);
        assert_eq!(
            lines,
            vec![
                "Host: real",
                "Host: injected",
                "Set-Cookie: z=1",
                "Set-Cookie: a=2",
            ]
        );
    }

    #[test]
    fn test_empty_collection_yields_nothing() {
        let lines = HeaderFormatter::new(&config(true, true)).format(&HeaderMap::new(), &ExtraHeaders::new(), Color::Red);
        assert!(lines.is_empty());
    }

    #[test]
    fn test_short_mode_hides_noisy_headers() {
        let map = headers(&[("accept", "*/*"), ("user-agent", "curl/8"), ("x-api-key", "k")]);
        let lines = HeaderFormatter::new(&config(true, false)).format(&map, &host("h"), Color::Blue);
        assert_eq!(lines, vec!["Host: h", "X-Api-Key: k"]);
    }

    #[test]
    fn test_short_mode_abbreviates_long_values() {
        let value: String = ('a'..='z').cycle().take(100).collect();
        let map = headers(&[("authorization", &value)]);
        let lines = HeaderFormatter::new(&config(true, false)).format(&map, &ExtraHeaders::new(), Color::Blue);
        let expected = format!("Authorization: {} ‥ {}", &value[..40], &value[76..]);
        assert_eq!(lines, vec![expected]);
    }

    #[test]
    fn test_long_values_untouched_without_short_mode() {
        let value = "x".repeat(200);
        let formatter = HeaderFormatter::new(&config(false, false));
        assert_eq!(formatter.abbreviate(&value), value.as_str());
    }

    #[test]
    fn test_abbreviation_respects_char_boundaries() {
        let value = "é".repeat(50);
        let formatter = HeaderFormatter::new(&config(true, false));
        let short = formatter.abbreviate(&value);
        assert!(short.contains(" ‥ "));
        assert!(short.len() < value.len());
    }

    #[test]
    fn test_colored_line() {
        let map = headers(&[("x-id", "42")]);
        let lines = HeaderFormatter::new(&config(false, true)).format(&map, &ExtraHeaders::new(), Color::Blue);
        assert_eq!(lines, vec!["\x1b[1;34mX-Id\x1b[m: \x1b[34m42\x1b[m"]);
    }
}
