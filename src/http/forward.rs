//! Upstream relay.
//!
//! # Responsibilities
//! - Send a request whose target is already resolved to its upstream
//! - Strip hop-by-hop headers in both directions
//! - Stream request and response bodies without buffering
//! - Map transport failures to gateway errors
//!
//! # Design Decisions
//! - No retries; a failed exchange is reported to the caller once
//! - Pooling is left to the hyper client
//! - The exchange lives inside the handler future, so a caller disconnect
//!   drops the upstream connection with it

use std::path::Path;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderName, Request, StatusCode, Version},
    response::{IntoResponse, Response},
};
use hyper_rustls::HttpsConnector;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::config::ProxyConfig;
use crate::net::tls::{install_crypto_provider, load_upstream_roots};

/// Headers that describe a single transport hop and are never relayed.
static HOP_BY_HOP: [HeaderName; 9] = [
    header::CONNECTION,
    HeaderName::from_static("proxy-connection"),
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Remove hop-by-hop headers, including any named by `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed.iter().chain(HOP_BY_HOP.iter()) {
        headers.remove(name);
    }
}

/// Error from a single upstream exchange.
#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    #[error("upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),

    #[error("upstream did not respond within {0:?}")]
    Timeout(Duration),
}

impl ForwardError {
    pub fn status(&self) -> StatusCode {
        match self {
            ForwardError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ForwardError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl IntoResponse for ForwardError {
    fn into_response(self) -> Response {
        let body = match self {
            ForwardError::Upstream(_) => "Bad gateway",
            ForwardError::Timeout(_) => "Gateway timeout",
        };
        (self.status(), body).into_response()
    }
}

/// Relays resolved requests to their upstream.
#[derive(Clone)]
pub struct Forwarder {
    client: Client<HttpsConnector<HttpConnector>, Body>,
    response_timeout: Option<Duration>,
}

impl Forwarder {
    /// Build a forwarder able to reach both `http` and `https` origins.
    ///
    /// Trust roots come from `UpstreamCaFile` when set. Otherwise the platform
    /// store is used, falling back to the bundled Mozilla roots when the
    /// platform has none.
    pub fn new(config: &ProxyConfig) -> Result<Self, std::io::Error> {
        install_crypto_provider();

        let mut http = HttpConnector::new();
        http.enforce_http(false);
        http.set_connect_timeout(config.connect_timeout_secs.map(Duration::from_secs));

        let roots = match &config.upstream_ca_file {
            Some(path) => {
                let tls = rustls::ClientConfig::builder()
                    .with_root_certificates(load_upstream_roots(Path::new(path))?)
                    .with_no_client_auth();
                hyper_rustls::HttpsConnectorBuilder::new().with_tls_config(tls)
            }
            None => match hyper_rustls::HttpsConnectorBuilder::new().with_native_roots() {
                Ok(builder) => builder,
                Err(e) => {
                    tracing::warn!(error = %e, "No platform trust roots, using bundled roots");
                    hyper_rustls::HttpsConnectorBuilder::new().with_webpki_roots()
                }
            },
        };
        let connector = roots
            .https_or_http()
            .enable_http1()
            .wrap_connector(http);

        let client = Client::builder(TokioExecutor::new()).build(connector);

        Ok(Self {
            client,
            response_timeout: config.upstream_timeout_secs.map(Duration::from_secs),
        })
    }

    /// Send the request and return the upstream response headers with a
    /// streaming body.
    pub async fn forward(&self, mut request: Request<Body>) -> Result<Response, ForwardError> {
        strip_hop_by_hop(request.headers_mut());
        *request.version_mut() = Version::HTTP_11;

        let exchange = self.client.request(request);
        let response = match self.response_timeout {
            Some(limit) => tokio::time::timeout(limit, exchange)
                .await
                .map_err(|_| ForwardError::Timeout(limit))??,
            None => exchange.await?,
        };

        let (mut parts, body) = response.into_parts();
        strip_hop_by_hop(&mut parts.headers);
        Ok(Response::from_parts(parts, Body::new(body)))
    }
}
