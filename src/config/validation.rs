//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (tail shorter than the header budget)
//! - Check that the upstream target parses
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::http::upstream::UpstreamTarget;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address must not be empty")]
    EmptyBindAddress,

    #[error("upstream.target is invalid: {0}")]
    InvalidTarget(String),

    #[error("render.max_header ({max_header}) must be greater than render.max_header_tail ({tail})")]
    HeaderTailTooLong { max_header: usize, tail: usize },
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.trim().is_empty() {
        errors.push(ValidationError::EmptyBindAddress);
    }

    if let Err(e) = UpstreamTarget::parse(&config.upstream.target) {
        errors.push(ValidationError::InvalidTarget(e.to_string()));
    }

    if config.render.max_header <= config.render.max_header_tail {
        errors.push(ValidationError::HeaderTailTooLong {
            max_header: config.render.max_header,
            tail: config.render.max_header_tail,
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
