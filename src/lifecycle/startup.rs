//! Startup orchestration.
//!
//! # Responsibilities
//! - Load configuration and redirect logging to the configured sink
//! - Dump the configuration instead of serving when asked
//! - Validate, then build the route table, bind the listener and serve
//!   (plain or TLS)
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The dump runs before semantic validation, so odd configs can be inspected
//! - Listeners start last (traffic only when ready)

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::sync::broadcast;

use crate::config::{
    config_warnings, dump_config, load_config, validate_config, ConfigError, ProxyConfig,
};
use crate::http::{ProxyServer, ServerError};
use crate::net::listener::{self, ListenerError};
use crate::net::tls::load_tls_config;
use crate::observability::{init_logging, metrics, LoggingError};

/// What the process was asked to do.
#[derive(Debug, Clone)]
pub struct StartupOptions {
    /// Path of the TOML configuration file.
    pub config_path: PathBuf,
    /// Write the parsed configuration to the log sink and stop.
    pub dump_config: bool,
}

/// How a successful run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The configuration was dumped; no listener was bound.
    ConfigDumped,
    /// The server ran and stopped after a shutdown signal.
    Stopped,
}

impl Outcome {
    /// Process exit status. Only a signal-driven stop exits 0.
    pub fn exit_status(self) -> u8 {
        match self {
            Outcome::Stopped => 0,
            // The dump is a diagnostic; the process never served.
            Outcome::ConfigDumped => 1,
        }
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to load config {path:?}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: ConfigError,
    },

    #[error(transparent)]
    Logging(#[from] LoggingError),

    #[error(transparent)]
    Invalid(ConfigError),

    #[error("failed to encode config dump: {0}")]
    DumpEncode(#[source] serde_json::Error),

    #[error("failed to write config dump: {0}")]
    DumpWrite(#[source] std::io::Error),

    #[error(transparent)]
    Server(#[from] ServerError),

    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error("failed to load TLS material: {0}")]
    Tls(#[source] std::io::Error),

    #[error("failed to start metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("server failed: {0}")]
    Serve(#[source] std::io::Error),
}

/// Run the proxy from the command-line options.
pub async fn run(
    options: &StartupOptions,
    shutdown: broadcast::Receiver<()>,
) -> Result<Outcome, StartupError> {
    let config = load_config(&options.config_path).map_err(|source| StartupError::Config {
        path: options.config_path.clone(),
        source,
    })?;

    let sink = init_logging(&config)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "rproxy starting");

    if options.dump_config {
        let dump = dump_config(&config).map_err(StartupError::DumpEncode)?;
        sink.write_raw(&dump).map_err(StartupError::DumpWrite)?;
        return Ok(Outcome::ConfigDumped);
    }

    validate_config(&config)
        .map_err(|errors| StartupError::Invalid(ConfigError::Validation(errors)))?;

    serve(&config, shutdown).await?;
    Ok(Outcome::Stopped)
}

/// Build the server from a loaded configuration and serve until shutdown.
pub async fn serve(
    config: &ProxyConfig,
    shutdown: broadcast::Receiver<()>,
) -> Result<(), StartupError> {
    tracing::info!(
        address = %config.address,
        tls = config.tls,
        upstreams = config.host.len(),
        upstream_timeout_secs = ?config.upstream_timeout_secs,
        "Configuration loaded"
    );
    for warning in config_warnings(config) {
        tracing::warn!("{}", warning);
    }

    let server = ProxyServer::new(config)?;
    for authority in server.routes().authorities() {
        tracing::debug!(authority = %authority, "Upstream registered");
    }

    if let Some(metrics_address) = &config.metrics_address {
        let addr = listener::resolve_address(metrics_address).await?;
        metrics::init_metrics(addr)?;
    }

    if config.tls {
        let tls = load_tls_config(Path::new(&config.cert_file), Path::new(&config.key_file))
            .await
            .map_err(StartupError::Tls)?;
        let addr = listener::resolve_address(&config.address).await?;
        server.run_tls(addr, tls, shutdown).await.map_err(StartupError::Serve)
    } else {
        let listener = listener::bind(&config.address).await?;
        server.run(listener, shutdown).await.map_err(StartupError::Serve)
    }
}
