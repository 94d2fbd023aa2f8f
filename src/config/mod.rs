//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → [--dumpconfig stops here]
//!     → validation.rs (semantic checks, warnings)
//!     → ProxyConfig (validated, immutable)
//!     → shared with the server at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{dump_config, load_config, parse_config, ConfigError};
pub use schema::ProxyConfig;
pub use schema::UpstreamConfig;
pub use validation::{config_warnings, validate_config, ConfigWarning, ValidationError};
