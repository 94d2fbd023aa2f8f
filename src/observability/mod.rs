//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log file (or stdout when none is configured)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Each request runs inside a span carrying its request ID
//! - Metrics are cheap (atomic increments)
//! - Secrets never appear in logs, spans or metric labels

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, LogSink, LoggingError};
