//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, proxy handler)
//!     → capture pipeline (request hook)
//!     → upstream.rs (rewrite target, strip hop-by-hop, send)
//!     → capture pipeline (response hook)
//!     → Send to client
//! ```

pub mod server;
pub mod upstream;

pub use server::{HttpServer, ServerError};
pub use upstream::{UpstreamClient, UpstreamError, UpstreamTarget};
