//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check header names are usable on the wire
//! - Check TLS material is named when TLS is enabled
//! - Flag configurations that serve but are probably not what was meant
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Upstream URLs are checked when the route table is built, not here
//! - An empty key or an empty upstream list still serves; they are warnings

use axum::http::HeaderName;
use tracing_subscriber::EnvFilter;

use crate::config::schema::ProxyConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// `Address` is empty.
    EmptyAddress,
    /// A configured header name is not a valid HTTP header name.
    InvalidHeaderName { field: &'static str, value: String },
    /// `ApiKeyHeader` and `HostHeader` name the same header.
    SameControlHeaders,
    /// TLS is enabled but a PEM path is missing.
    MissingTlsFile(&'static str),
    /// `LogLevel` is not a valid filter directive.
    InvalidLogLevel(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::EmptyAddress => write!(f, "Address must not be empty"),
            ValidationError::InvalidHeaderName { field, value } => {
                write!(f, "{} is not a valid header name: {:?}", field, value)
            }
            ValidationError::SameControlHeaders => {
                write!(f, "ApiKeyHeader and HostHeader must differ")
            }
            ValidationError::MissingTlsFile(field) => {
                write!(f, "{} is required when TLS is enabled", field)
            }
            ValidationError::InvalidLogLevel(level) => {
                write!(f, "LogLevel is not a valid filter: {:?}", level)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// A configuration the proxy can serve, but likely by mistake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigWarning {
    /// `ApiKey` is empty: any caller sending an empty key header is admitted.
    EmptyApiKey,
    /// No `[[Host]]` entries: every authenticated request is answered 400.
    NoUpstreams,
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigWarning::EmptyApiKey => {
                write!(f, "ApiKey is empty; an empty key header is accepted")
            }
            ConfigWarning::NoUpstreams => {
                write!(f, "no Host entries; every request will be rejected")
            }
        }
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.address.trim().is_empty() {
        errors.push(ValidationError::EmptyAddress);
    }

    let key_header = check_header(&mut errors, "ApiKeyHeader", &config.api_key_header);
    let host_header = check_header(&mut errors, "HostHeader", &config.host_header);
    if let (Some(a), Some(b)) = (key_header, host_header) {
        if a == b {
            errors.push(ValidationError::SameControlHeaders);
        }
    }

    if config.tls {
        if config.cert_file.is_empty() {
            errors.push(ValidationError::MissingTlsFile("CertFile"));
        }
        if config.key_file.is_empty() {
            errors.push(ValidationError::MissingTlsFile("KeyFile"));
        }
    }

    if EnvFilter::try_new(&config.log_level).is_err() {
        errors.push(ValidationError::InvalidLogLevel(config.log_level.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Conditions worth a startup warning. Never fatal.
pub fn config_warnings(config: &ProxyConfig) -> Vec<ConfigWarning> {
    let mut warnings = Vec::new();
    if config.api_key.is_empty() {
        warnings.push(ConfigWarning::EmptyApiKey);
    }
    if config.host.is_empty() {
        warnings.push(ConfigWarning::NoUpstreams);
    }
    warnings
}

fn check_header(
    errors: &mut Vec<ValidationError>,
    field: &'static str,
    value: &str,
) -> Option<HeaderName> {
    match HeaderName::from_bytes(value.as_bytes()) {
        Ok(name) => Some(name),
        Err(_) => {
            errors.push(ValidationError::InvalidHeaderName {
                field,
                value: value.to_string(),
            });
            None
        }
    }
}
