//! Correlation identifiers.
//!
//! # Responsibilities
//! - Issue one identifier per intercepted request
//! - Carry the identifier to the upstream in the `X-WTF-ID` header
//!
//! # Design Decisions
//! - The counter is owned by a pipeline instance, not a process global, so
//!   independent pipelines number their exchanges independently
//! - Identifiers start at 1 and are never reused

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::http::{HeaderMap, HeaderName, HeaderValue};

/// Header stamped on every forwarded request.
pub static CORRELATION_HEADER: HeaderName = HeaderName::from_static("x-wtf-id");

/// Identifier linking a request transcript to its response transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CorrelationId(u64);

impl CorrelationId {
    /// Get the raw ID value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// Read the identifier back from a forwarded request's headers.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        headers
            .get(&CORRELATION_HEADER)?
            .to_str()
            .ok()?
            .trim()
            .parse()
            .ok()
            .map(Self)
    }

    /// Decimal header value.
    pub fn to_header_value(&self) -> HeaderValue {
        HeaderValue::from(self.0)
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic source of correlation identifiers.
#[derive(Debug, Default)]
pub struct CorrelationCounter {
    issued: AtomicU64,
}

impl CorrelationCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next identifier.
    pub fn next_id(&self) -> CorrelationId {
        CorrelationId(self.issued.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// Number of identifiers issued so far.
    pub fn issued(&self) -> u64 {
        self.issued.load(Ordering::Relaxed)
    }
}
