//! TCP listener setup.
//!
//! # Responsibilities
//! - Resolve the configured bind address (a bare `:port` means all interfaces)
//! - Bind the listening socket
//! - Report bind failures as a typed error

use std::net::SocketAddr;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::ListenerConfig;

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// The bind address is not a socket address.
    #[error("invalid bind address {address:?}: {source}")]
    Address {
        address: String,
        #[source]
        source: std::net::AddrParseError,
    },

    /// Failed to bind to address.
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

/// Bind a TCP listener on the configured address.
pub async fn bind(config: &ListenerConfig) -> Result<TcpListener, ListenerError> {
    let address = config.socket_address();
    let addr: SocketAddr = address
        .parse()
        .map_err(|source| ListenerError::Address { address, source })?;

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ListenerError::Bind { address: addr, source })?;

    if let Ok(local_addr) = listener.local_addr() {
        tracing::info!(address = %local_addr, "Listener bound");
    }

    Ok(listener)
}
