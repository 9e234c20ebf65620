//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields (correlation_id, upstream, ...)
//!
//! Consumers:
//!     → logging.rs (fmt layer on stderr, EnvFilter)
//! ```
//!
//! The transcript itself is not a log stream; it is written by `console`.

pub mod logging;

pub use logging::init_logging;
