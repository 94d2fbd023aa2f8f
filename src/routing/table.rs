//! Upstream route table.
//!
//! # Responsibilities
//! - Parse configured origin URLs into scheme + authority
//! - Map the authority named by the routing header to its origin
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(1) lookup via HashMap
//! - Authorities compared case-insensitively (RFC 9110 host semantics), so
//!   origins differing only in letter case share one entry
//! - Duplicate authorities: the last configured origin wins

use std::collections::HashMap;
use std::str::FromStr;

use axum::http::uri::{Authority, Scheme};
use axum::http::Uri;
use thiserror::Error;

use crate::config::UpstreamConfig;

/// Error raised while compiling the route table.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("invalid upstream URL {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: axum::http::uri::InvalidUri,
    },

    #[error("upstream URL {0:?} must use http or https")]
    UnsupportedScheme(String),

    #[error("upstream URL {0:?} has no host")]
    MissingAuthority(String),
}

/// A resolved upstream origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    scheme: Scheme,
    authority: Authority,
}

impl Origin {
    /// Parse an origin URL. Path and query are ignored; user-info is dropped.
    pub fn parse(url: &str) -> Result<Self, RouteError> {
        let uri = Uri::from_str(url).map_err(|source| RouteError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;

        let scheme = match uri.scheme() {
            Some(s) if *s == Scheme::HTTP || *s == Scheme::HTTPS => s.clone(),
            _ => return Err(RouteError::UnsupportedScheme(url.to_string())),
        };

        let raw = uri
            .authority()
            .map(|a| a.as_str())
            .ok_or_else(|| RouteError::MissingAuthority(url.to_string()))?;
        let host_port = raw.rsplit('@').next().unwrap_or(raw);
        if host_port.is_empty() || host_port.starts_with(':') {
            return Err(RouteError::MissingAuthority(url.to_string()));
        }
        let authority = Authority::from_str(host_port).map_err(|source| RouteError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;

        Ok(Self { scheme, authority })
    }

    pub fn scheme(&self) -> &Scheme {
        &self.scheme
    }

    pub fn authority(&self) -> &Authority {
        &self.authority
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}://{}", self.scheme, self.authority)
    }
}

/// Static mapping from upstream authority to origin.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: HashMap<String, Origin>,
}

impl RouteTable {
    /// Compile the table from configured upstreams.
    ///
    /// Fails on the first origin that does not parse.
    pub fn build(upstreams: &[UpstreamConfig]) -> Result<Self, RouteError> {
        let mut routes = HashMap::with_capacity(upstreams.len());

        for upstream in upstreams {
            let origin = Origin::parse(&upstream.url)?;
            let key = origin.authority.as_str().to_ascii_lowercase();
            if let Some(previous) = routes.insert(key, origin) {
                tracing::warn!(
                    authority = %previous.authority,
                    replaced = %previous,
                    "Duplicate upstream authority, last configured origin wins"
                );
            }
        }

        Ok(Self { routes })
    }

    /// Look up the origin for the authority named by a request.
    pub fn resolve(&self, host_key: &str) -> Option<&Origin> {
        if host_key.bytes().any(|b| b.is_ascii_uppercase()) {
            self.routes.get(&host_key.to_ascii_lowercase())
        } else {
            self.routes.get(host_key)
        }
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Configured authorities, in no particular order.
    pub fn authorities(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }
}
