//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, tracing span with request ID)
//!     → gate.rs (shared-key check, routing header lookup, retarget)
//!     → forward.rs (hop-by-hop stripping, upstream exchange)
//!     → Send upstream response to client
//! ```

pub mod forward;
pub mod gate;
pub mod server;

pub use forward::{Forwarder, ForwardError};
pub use gate::{gate_handler, GateState};
pub use server::{ProxyServer, ServerError};
