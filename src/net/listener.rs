//! Listen address handling.
//!
//! # Responsibilities
//! - Normalize `Address` (accepts `host:port` and `:port`)
//! - Resolve and bind the listening socket

use std::net::SocketAddr;
use tokio::net::TcpListener;

/// Error type for listener operations.
#[derive(Debug)]
pub enum ListenerError {
    /// Address did not resolve to any socket address.
    Resolve(String, std::io::Error),
    /// Failed to bind to address.
    Bind(SocketAddr, std::io::Error),
}

impl std::fmt::Display for ListenerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListenerError::Resolve(addr, e) => write!(f, "Failed to resolve {}: {}", addr, e),
            ListenerError::Bind(addr, e) => write!(f, "Failed to bind {}: {}", addr, e),
        }
    }
}

impl std::error::Error for ListenerError {}

/// Expand a `:port` address to all interfaces.
pub fn normalize_address(address: &str) -> String {
    let address = address.trim();
    if address.starts_with(':') {
        format!("0.0.0.0{}", address)
    } else {
        address.to_string()
    }
}

/// Resolve the configured address to the first matching socket address.
pub async fn resolve_address(address: &str) -> Result<SocketAddr, ListenerError> {
    let address = normalize_address(address);
    let mut addrs = tokio::net::lookup_host(&address)
        .await
        .map_err(|e| ListenerError::Resolve(address.clone(), e))?;
    addrs.next().ok_or_else(|| {
        ListenerError::Resolve(
            address.clone(),
            std::io::Error::new(std::io::ErrorKind::NotFound, "no addresses found"),
        )
    })
}

/// Resolve and bind the configured address.
pub async fn bind(address: &str) -> Result<TcpListener, ListenerError> {
    let addr = resolve_address(address).await?;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| ListenerError::Bind(addr, e))?;

    tracing::info!(
        address = %listener.local_addr().unwrap_or(addr),
        "Listener bound"
    );
    Ok(listener)
}
