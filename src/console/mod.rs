//! Console output subsystem.
//!
//! # Data Flow
//! ```text
//! capture hook
//!     → transcript.rs (TranscriptBlock, built per request/response)
//!     → serializer.rs (single locked write per block)
//!     → stdout (or any Write sink)
//! ```
//!
//! # Ordering Modes
//! - Concurrent (default): blocks are atomic, exchanges may interleave
//! - Serialized: one exchange permit at a time, request and response blocks
//!   of an exchange are adjacent

pub mod serializer;
pub mod transcript;

pub use serializer::{Console, ExchangePermit, MemorySink};
pub use transcript::TranscriptBlock;
