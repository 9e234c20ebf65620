//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Configured bind address
//!     → listener.rs (resolve, bind)
//!     → Hand off to HTTP layer
//! ```
//!
//! A bind failure is fatal at startup; the caller logs it and exits.

pub mod listener;

pub use listener::{bind, ListenerError};
