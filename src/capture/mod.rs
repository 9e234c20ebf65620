//! Traffic capture subsystem.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → pipeline.rs   (request hook: id, transcript, rewrite, stamp)
//!     → snapshot.rs   (buffer body, hand back a replayable copy)
//!     → upstream transport (http::upstream)
//!     → pipeline.rs   (response hook: transcript, release exchange)
//!     → client
//! ```
//!
//! # Design Decisions
//! - Correlation state belongs to a pipeline instance, never a global
//! - The request and response blocks are linked by an in-memory exchange
//!   token; the `X-WTF-ID` header is still stamped for upstream visibility
//! - Capture problems are logged, never surfaced to the HTTP exchange

pub mod correlation;
pub mod pipeline;
pub mod snapshot;

pub use correlation::{CorrelationCounter, CorrelationId, CORRELATION_HEADER};
pub use pipeline::{CapturePipeline, Exchange};
pub use snapshot::{snapshot_body, CaptureError};
