//! Configuration schema definitions.
//!
//! Field names follow the PascalCase keys of the proxy's TOML file
//! (`Address`, `TLS`, `ApiKey`, ...). All types derive Serde traits so the
//! same structure can be parsed from TOML and dumped as JSON.

use serde::{Deserialize, Serialize};

/// Root configuration for the proxy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ProxyConfig {
    /// Listen address (e.g., "0.0.0.0:8080" or ":8080").
    pub address: String,

    /// Serve HTTPS instead of plain HTTP.
    #[serde(rename = "TLS", alias = "Tls")]
    pub tls: bool,

    /// Path to the private key file (PEM). Required when `tls` is set.
    pub key_file: String,

    /// Path to the certificate chain file (PEM). Required when `tls` is set.
    pub cert_file: String,

    /// Upstream origins requests may be routed to.
    pub host: Vec<UpstreamConfig>,

    /// Shared secret every caller must present.
    pub api_key: String,

    /// Name of the header carrying the intended upstream authority.
    pub host_header: String,

    /// Name of the header carrying the caller's key.
    pub api_key_header: String,

    /// Path of the log file, opened for append. Empty logs to stdout.
    pub log_file: String,

    /// Log filter directive (trace, debug, info, warn, error).
    pub log_level: String,

    /// Upstream connection establishment timeout in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connect_timeout_secs: Option<u64>,

    /// Deadline for the upstream response headers in seconds.
    /// Absent means no per-request deadline.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream_timeout_secs: Option<u64>,

    /// PEM bundle of CAs trusted for `https` upstreams. Replaces the
    /// platform trust store when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream_ca_file: Option<String>,

    /// Prometheus exporter bind address. Absent disables the exporter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics_address: Option<String>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0:8080".to_string(),
            tls: false,
            key_file: String::new(),
            cert_file: String::new(),
            host: Vec::new(),
            api_key: String::new(),
            host_header: "X-Rproxy-Host".to_string(),
            api_key_header: "X-Rproxy-Key".to_string(),
            log_file: String::new(),
            log_level: "info".to_string(),
            connect_timeout_secs: None,
            upstream_timeout_secs: None,
            upstream_ca_file: None,
            metrics_address: None,
        }
    }
}

/// A single upstream origin.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct UpstreamConfig {
    /// Origin URL, e.g. "https://svc-a.internal:8443".
    #[serde(rename = "URL", alias = "Url")]
    pub url: String,
}

impl UpstreamConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}
