//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (at startup):
//!     [[Host]] URL entries
//!     → table.rs (parse origins, key by authority)
//!     → Freeze as immutable RouteTable
//!
//! Per request:
//!     routing header value
//!     → RouteTable::resolve
//!     → Return: Origin or None
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Deterministic: same input always resolves to the same origin

pub mod table;

pub use table::{Origin, RouteError, RouteTable};
