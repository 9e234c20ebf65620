//! Console output ordering.
//!
//! # Responsibilities
//! - Write each transcript block with a single locked write
//! - In serialized mode, hand out one exchange permit at a time so a
//!   request's block and its response's block are never separated
//!
//! # Design Decisions
//! - The exchange lock is a one-permit semaphore; the permit lives inside the
//!   capture pipeline's exchange token and is released when that token drops
//! - Sink write failures are logged and swallowed

use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::console::transcript::TranscriptBlock;

type Sink = Arc<Mutex<Box<dyn Write + Send>>>;

/// Operator-facing transcript output.
#[derive(Clone)]
pub struct Console {
    sink: Sink,
    exchange_lock: Option<Arc<Semaphore>>,
}

impl Console {
    /// Console writing to an arbitrary sink.
    pub fn new<W: Write + Send + 'static>(writer: W, serialize: bool) -> Self {
        Self {
            sink: Arc::new(Mutex::new(Box::new(writer))),
            exchange_lock: serialize.then(|| Arc::new(Semaphore::new(1))),
        }
    }

    /// Console writing to the process stdout.
    pub fn stdout(serialize: bool) -> Self {
        Self::new(io::stdout(), serialize)
    }

    /// Whether whole exchanges are serialized.
    pub fn is_serialized(&self) -> bool {
        self.exchange_lock.is_some()
    }

    /// Wait for the right to write an exchange.
    ///
    /// Returns immediately in concurrent mode. In serialized mode this waits
    /// until every earlier exchange has released its permit.
    pub async fn begin_exchange(&self) -> ExchangePermit {
        let Some(lock) = &self.exchange_lock else {
            return ExchangePermit { permit: None };
        };

        match lock.clone().acquire_owned().await {
            Ok(permit) => ExchangePermit {
                permit: Some(permit),
            },
            Err(e) => {
                tracing::error!(error = %e, "Exchange lock closed, continuing unserialized");
                ExchangePermit { permit: None }
            }
        }
    }

    /// Write a block in one piece.
    pub fn emit(&self, block: &TranscriptBlock) {
        let text = block.render();
        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = sink.write_all(text.as_bytes()).and_then(|_| sink.flush()) {
            tracing::warn!(error = %e, "Failed to write transcript block");
        }
    }
}

impl std::fmt::Debug for Console {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console")
            .field("serialized", &self.is_serialized())
            .finish_non_exhaustive()
    }
}

/// Right to write one exchange's transcript.
///
/// Released on drop.
#[derive(Debug)]
pub struct ExchangePermit {
    permit: Option<OwnedSemaphorePermit>,
}

impl ExchangePermit {
    /// Whether this permit actually holds the exchange lock.
    pub fn is_exclusive(&self) -> bool {
        self.permit.is_some()
    }
}

/// In-memory sink, cloneable so the writer and a reader can share it.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far.
    pub fn contents(&self) -> String {
        let buf = self.buf.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&buf).into_owned()
    }
}

impl Write for MemorySink {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
