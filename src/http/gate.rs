//! Access gate: shared-key authentication and header-based routing.
//!
//! # Responsibilities
//! - Reject callers whose key header does not match the shared key (401)
//! - Resolve the routing header against the route table (400 when unknown)
//! - Retarget the request at the resolved origin and drop control headers
//! - Hand the request to the forwarder
//!
//! # Design Decisions
//! - Key checked before the route table is consulted
//! - Header values are never logged
//! - Rejection bodies are fixed strings; nothing about the config leaks

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{header, uri::PathAndQuery, HeaderName, HeaderValue, Request, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;

use crate::http::forward::Forwarder;
use crate::observability::metrics::{self, Rejection};
use crate::routing::{Origin, RouteTable};

pub const BAD_KEY_BODY: &str = "Bad rproxy key";
pub const BAD_HOST_BODY: &str = "Bad rproxy host";

/// Immutable state shared by every request.
#[derive(Clone)]
pub struct GateState {
    pub routes: Arc<RouteTable>,
    pub forwarder: Forwarder,
    pub api_key: Arc<str>,
    pub api_key_header: HeaderName,
    pub host_header: HeaderName,
}

impl GateState {
    /// True when the request carries exactly the shared key.
    fn key_matches(&self, request: &Request<Body>) -> bool {
        match request.headers().get(&self.api_key_header) {
            Some(value) => value.as_bytes().ct_eq(self.api_key.as_bytes()).into(),
            None => false,
        }
    }

    /// Origin named by the routing header, if any.
    fn intended_origin(&self, request: &Request<Body>) -> Option<&Origin> {
        let intended = request.headers().get(&self.host_header)?.to_str().ok()?;
        self.routes.resolve(intended.trim())
    }

    /// Retarget the request at `origin` and drop the control headers.
    fn retarget(&self, request: &mut Request<Body>, origin: &Origin) {
        let path_and_query = request
            .uri()
            .path_and_query()
            .cloned()
            .unwrap_or_else(|| PathAndQuery::from_static("/"));

        let mut parts = std::mem::take(request.uri_mut()).into_parts();
        parts.scheme = Some(origin.scheme().clone());
        parts.authority = Some(origin.authority().clone());
        parts.path_and_query = Some(path_and_query);
        // scheme, authority and path are all set, so this cannot fail
        if let Ok(uri) = Uri::from_parts(parts) {
            *request.uri_mut() = uri;
        }

        let headers = request.headers_mut();
        if let Ok(host) = HeaderValue::from_str(origin.authority().as_str()) {
            headers.insert(header::HOST, host);
        }
        headers.remove(&self.api_key_header);
        headers.remove(&self.host_header);
    }
}

/// Handler for every inbound request.
pub async fn gate_handler(State(state): State<GateState>, mut request: Request<Body>) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();

    if !state.key_matches(&request) {
        tracing::warn!(method = %method, path = %request.uri().path(), "Rejected request with bad key");
        metrics::record_rejection(Rejection::BadKey);
        metrics::record_request(&method, StatusCode::UNAUTHORIZED.as_u16(), "none", start);
        return (StatusCode::UNAUTHORIZED, BAD_KEY_BODY).into_response();
    }

    let origin = match state.intended_origin(&request) {
        Some(origin) => origin.clone(),
        None => {
            tracing::warn!(method = %method, path = %request.uri().path(), "Rejected request for unknown host");
            metrics::record_rejection(Rejection::UnknownHost);
            metrics::record_request(&method, StatusCode::BAD_REQUEST.as_u16(), "none", start);
            return (StatusCode::BAD_REQUEST, BAD_HOST_BODY).into_response();
        }
    };

    state.retarget(&mut request, &origin);
    let upstream = origin.authority().as_str();

    tracing::debug!(upstream = %origin, path = %request.uri().path(), "Forwarding request");

    match state.forwarder.forward(request).await {
        Ok(response) => {
            metrics::record_request(&method, response.status().as_u16(), upstream, start);
            response
        }
        Err(e) => {
            tracing::error!(upstream = %origin, error = %e, "Upstream error");
            metrics::record_request(&method, e.status().as_u16(), upstream, start);
            e.into_response()
        }
    }
}
