//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the intercepting proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Upstream the proxy forwards every request to.
    pub upstream: UpstreamConfig,

    /// Transcript rendering settings.
    pub render: RenderConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., ":8080", "127.0.0.1:8080").
    pub bind_address: String,
}

impl ListenerConfig {
    /// Address suitable for binding a socket.
    ///
    /// A bare `:port` listens on all interfaces.
    pub fn socket_address(&self) -> String {
        if self.bind_address.starts_with(':') {
            format!("0.0.0.0{}", self.bind_address)
        } else {
            self.bind_address.clone()
        }
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: ":8080".to_string(),
        }
    }
}

/// Upstream configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Upstream target (e.g., "localhost:80", "https://example.com").
    pub target: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            target: "localhost:80".to_string(),
        }
    }
}

/// When to color the transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Color when stdout is a terminal.
    #[default]
    Auto,
    Always,
    Never,
}

/// Transcript rendering configuration.
///
/// Immutable once the proxy starts; shared read-only by every exchange.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Color selection.
    pub color: ColorMode,

    /// Resolved color flag. Filled in at startup from `color`.
    #[serde(skip)]
    pub colors: bool,

    /// Hide noisy headers and abbreviate long header values.
    pub short_headers: bool,

    /// Hold one request's transcript lock until its response is rendered.
    pub serialize: bool,

    /// Maximum body bytes to display.
    pub max_body: usize,

    /// Header values longer than this are abbreviated in short-header mode.
    pub max_header: usize,

    /// Trailing bytes kept when a header value is abbreviated.
    pub max_header_tail: usize,
}

impl RenderConfig {
    /// Resolve `color` against whether the transcript goes to a terminal.
    pub fn resolve_colors(&mut self, is_terminal: bool) {
        self.colors = match self.color {
            ColorMode::Auto => is_terminal,
            ColorMode::Always => true,
            ColorMode::Never => false,
        };
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            color: ColorMode::Auto,
            colors: false,
            short_headers: false,
            serialize: false,
            max_body: 1024,
            max_header: 64,
            max_header_tail: 24,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log filter directive (trace, debug, info, warn, error or a full EnvFilter).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
