//! Transcript rendering subsystem.
//!
//! # Data Flow
//! ```text
//! captured exchange
//!     → headers.rs (merge, sort, filter, abbreviate)
//!     → sniff.rs   (content-type classification)
//!     → body.rs    (truncate, escape)
//!     → color.rs   (ANSI painting, when enabled)
//!     → lines for a transcript block
//! ```
//!
//! # Design Decisions
//! - Every renderer is pure: same bytes and config, same text
//! - Renderers never fail; odd input degrades to escaped output

pub mod body;
pub mod color;
pub mod headers;
pub mod sniff;

pub use body::BodyRenderer;
pub use color::{Color, Painter};
pub use headers::{ExtraHeaders, HeaderFormatter};
pub use sniff::{ContentSniffer, MagicSniffer};
