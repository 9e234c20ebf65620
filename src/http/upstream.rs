//! Upstream target and transport.
//!
//! # Responsibilities
//! - Parse the configured target (`host:port`, optionally `http://` / `https://`)
//! - Rewrite request URIs to point at the upstream
//! - Send requests upstream over a pooled HTTP/HTTPS client
//! - Strip hop-by-hop headers in both directions
//!
//! # Design Decisions
//! - Upstream requests are always sent as HTTP/1.1; the connector may still
//!   negotiate HTTP/2 via ALPN for TLS targets
//! - Transport errors are returned to the caller, which answers 502

use std::fmt;
use std::str::FromStr;

use axum::body::Body;
use axum::http::uri::{Authority, InvalidUri, PathAndQuery, Scheme};
use axum::http::{HeaderMap, Request, Response, Uri, Version};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use thiserror::Error;

// RFC 7230 Section 6.1: hop-by-hop headers are not forwarded by proxies.
const HOP_BY_HOP_HEADERS: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Error type for target parsing.
#[derive(Debug, Error)]
pub enum TargetError {
    #[error("missing host in upstream target {0:?}")]
    MissingHost(String),

    #[error("invalid upstream authority {target:?}: {source}")]
    InvalidAuthority {
        target: String,
        #[source]
        source: InvalidUri,
    },
}

/// Error type for upstream exchanges.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream request failed: {0}")]
    Request(#[from] hyper_util::client::legacy::Error),
}

/// Where every request is forwarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamTarget {
    scheme: Scheme,
    authority: Authority,
}

impl UpstreamTarget {
    /// Parse `host[:port]` with an optional `http://` or `https://` prefix.
    pub fn parse(target: &str) -> Result<Self, TargetError> {
        let (scheme, rest) = if let Some(rest) = target.strip_prefix("https://") {
            (Scheme::HTTPS, rest)
        } else if let Some(rest) = target.strip_prefix("http://") {
            (Scheme::HTTP, rest)
        } else {
            (Scheme::HTTP, target)
        };

        let rest = rest.trim_end_matches('/');
        if rest.is_empty() {
            return Err(TargetError::MissingHost(target.to_string()));
        }

        let authority = Authority::from_str(rest).map_err(|source| TargetError::InvalidAuthority {
            target: target.to_string(),
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

    /// The same path and query, addressed to the upstream.
    pub fn rewrite(&self, uri: &Uri) -> Uri {
        let path_and_query = uri
            .path_and_query()
            .cloned()
            .unwrap_or_else(|| PathAndQuery::from_static("/"));

        Uri::builder()
            .scheme(self.scheme.clone())
            .authority(self.authority.clone())
            .path_and_query(path_and_query)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, uri = %uri, "Failed to rewrite URI, forwarding as-is");
                uri.clone()
            })
    }
}

impl fmt::Display for UpstreamTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.authority)
    }
}

/// Remove hop-by-hop headers, including any named by `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let named: Vec<String> = headers
        .get_all("connection")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(|name| name.trim().to_ascii_lowercase())
        .filter(|name| !name.is_empty())
        .collect();

    for name in HOP_BY_HOP_HEADERS.iter().copied().chain(named.iter().map(String::as_str)) {
        headers.remove(name);
    }
}

/// Pooled client that forwards requests to the upstream.
#[derive(Clone)]
pub struct UpstreamClient {
    client: Client<HttpsConnector<HttpConnector>, Body>,
}

impl UpstreamClient {
    /// Build a client able to reach both `http` and `https` upstreams.
    ///
    /// Uses the platform trust store, or the bundled Mozilla roots when the
    /// platform has none.
    pub fn new() -> Self {
        let builder = match HttpsConnectorBuilder::new().with_native_roots() {
            Ok(builder) => builder,
            Err(e) => {
                tracing::warn!(error = %e, "Native root certificates unavailable, using bundled roots");
                HttpsConnectorBuilder::new().with_webpki_roots()
            }
        };
        let https = builder
            .https_or_http()
            .enable_http1()
            .enable_http2()
            .build();

        let client = Client::builder(TokioExecutor::new()).build(https);
        Self { client }
    }

    /// Send a request upstream and return its response.
    pub async fn forward(&self, mut request: Request<Body>) -> Result<Response<Body>, UpstreamError> {
        strip_hop_by_hop(request.headers_mut());
        *request.version_mut() = Version::HTTP_11;

        let response = self.client.request(request).await?;

        let (mut parts, body) = response.into_parts();
        strip_hop_by_hop(&mut parts.headers);
        Ok(Response::from_parts(parts, Body::new(body)))
    }
}

impl Default for UpstreamClient {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for UpstreamClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamClient").finish_non_exhaustive()
    }
}
