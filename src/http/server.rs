//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the access gate as the only handler
//! - Wire up middleware (tracing with request IDs)
//! - Serve plain HTTP on a bound listener, or HTTPS with rustls
//! - Stop accepting on shutdown and drain in-flight requests

use axum::{body::Body, http::{HeaderName, Request}, Router};
use axum_server::tls_rustls::RustlsConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::config::ProxyConfig;
use crate::http::forward::Forwarder;
use crate::http::gate::{gate_handler, GateState};
use crate::routing::{RouteError, RouteTable};

/// How long TLS connections may drain after shutdown is requested.
const TLS_DRAIN_GRACE: Duration = Duration::from_secs(10);

/// Errors raised while assembling the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Routes(#[from] RouteError),

    #[error("invalid {field} header name: {value:?}")]
    HeaderName { field: &'static str, value: String },

    #[error("failed to load UpstreamCaFile {path:?}: {source}")]
    UpstreamCa {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// HTTP server for the proxy.
pub struct ProxyServer {
    router: Router,
    routes: Arc<RouteTable>,
}

impl ProxyServer {
    /// Build the route table and handler state from the configuration.
    pub fn new(config: &ProxyConfig) -> Result<Self, ServerError> {
        let routes = Arc::new(RouteTable::build(&config.host)?);

        let state = GateState {
            routes: Arc::clone(&routes),
            forwarder: Forwarder::new(config).map_err(|source| ServerError::UpstreamCa {
                path: config.upstream_ca_file.clone().unwrap_or_default(),
                source,
            })?,
            api_key: Arc::from(config.api_key.as_str()),
            api_key_header: header_name("ApiKeyHeader", &config.api_key_header)?,
            host_header: header_name("HostHeader", &config.host_header)?,
        };

        let router = Self::build_router(state);
        Ok(Self { router, routes })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: GateState) -> Router {
        Router::new()
            .fallback(gate_handler)
            .with_state(state)
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    request_id = %Uuid::new_v4(),
                    method = %request.method(),
                    uri = %request.uri()
                )
            }))
    }

    /// The compiled route table.
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Serve plain HTTP on the given listener until shutdown.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, upstreams = self.routes.len(), "HTTP server starting");

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Serve HTTPS on `addr` until shutdown.
    pub async fn run_tls(
        self,
        addr: SocketAddr,
        tls: RustlsConfig,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        tracing::info!(address = %addr, upstreams = self.routes.len(), "HTTPS server starting");

        let handle = axum_server::Handle::new();
        let signal = handle.clone();
        tokio::spawn(async move {
            let _ = shutdown.recv().await;
            signal.graceful_shutdown(Some(TLS_DRAIN_GRACE));
        });

        axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(self.router.into_make_service())
            .await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }
}

fn header_name(field: &'static str, value: &str) -> Result<HeaderName, ServerError> {
    HeaderName::from_bytes(value.as_bytes()).map_err(|_| ServerError::HeaderName {
        field,
        value: value.to_string(),
    })
}
