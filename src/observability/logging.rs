//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the global `tracing` subscriber
//! - Build the log filter from `RUST_LOG` or the configured level
//!
//! Diagnostics go to stderr; stdout carries the transcript only.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Crate target used when a bare level is configured.
const CRATE_TARGET: &str = "wtf_proxy";

/// Filter directives for a configured level.
///
/// A bare level (`debug`) is scoped to this crate; anything containing a
/// target or a list (`wtf_proxy=debug,tower_http=trace`) is used verbatim.
pub fn filter_directives(level: &str) -> String {
    let level = level.trim();
    if level.is_empty() {
        format!("{CRATE_TARGET}=info")
    } else if level.contains('=') || level.contains(',') {
        level.to_string()
    } else {
        format!("{CRATE_TARGET}={level}")
    }
}

/// Install the global subscriber. `RUST_LOG` wins over `level` when set.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_directives(level)));

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();

    if installed.is_err() {
        tracing::debug!("Global subscriber already installed");
    }
}
