//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Address from config
//!     → listener.rs (normalize, resolve, bind)
//!     → tls.rs (optional PEM loading for HTTPS)
//!     → Hand off to HTTP layer
//! ```
//!
//! # Design Decisions
//! - Bind and TLS errors are fatal at startup, never per request
//! - TLS is optional and selected by a single config flag

pub mod listener;
pub mod tls;
