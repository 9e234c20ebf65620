//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    body::Bytes,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{any, get},
    Router,
};
use tokio::net::TcpListener;

use wtf_proxy::config::ProxyConfig;
use wtf_proxy::console::{Console, MemorySink};
use wtf_proxy::http::HttpServer;
use wtf_proxy::lifecycle::Shutdown;

/// Start a mock upstream.
///
/// - `/json` answers `{"a":1}` as `application/json`
/// - `/slow` answers `slow` after 300ms
/// - `/missing` answers 404
/// - anything else echoes the request body back, reporting the
///   `X-WTF-ID` and `Host` it saw as `X-Seen-Wtf-Id` and `X-Seen-Host`
pub async fn start_mock_upstream(addr: SocketAddr) {
    let app = Router::new()
        .route("/json", get(json))
        .route("/slow", any(slow))
        .route("/missing", any(missing))
        .fallback(echo);

    let listener = TcpListener::bind(addr).await.unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
}

async fn echo(headers: HeaderMap, body: Bytes) -> impl IntoResponse {
    let mut reply = HeaderMap::new();
    for (seen, name) in [("x-seen-wtf-id", "x-wtf-id"), ("x-seen-host", "host")] {
        if let Some(value) = headers.get(name) {
            reply.insert(seen, value.clone());
        }
    }
    reply.insert("content-type", HeaderValue::from_static("application/octet-stream"));
    (StatusCode::OK, reply, body)
}

async fn json() -> impl IntoResponse {
    ([("content-type", "application/json")], r#"{"a":1}"#)
}

async fn slow() -> &'static str {
    tokio::time::sleep(Duration::from_millis(300)).await;
    "slow"
}

async fn missing() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "no such thing")
}

/// A running proxy whose transcript is captured in memory.
pub struct TestProxy {
    pub addr: SocketAddr,
    pub transcript: MemorySink,
    shutdown: Shutdown,
}

impl TestProxy {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn stop(&self) {
        self.shutdown.trigger();
    }
}

impl Drop for TestProxy {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start the proxy on `proxy_addr`, forwarding to `upstream_addr`.
///
/// `configure` adjusts the config before the server is built. Colors stay off.
pub async fn start_proxy(
    proxy_addr: SocketAddr,
    upstream_addr: SocketAddr,
    configure: impl FnOnce(&mut ProxyConfig),
) -> TestProxy {
    let mut config = ProxyConfig::default();
    config.listener.bind_address = proxy_addr.to_string();
    config.upstream.target = upstream_addr.to_string();
    configure(&mut config);
    config.render.resolve_colors(false);

    let transcript = MemorySink::new();
    let console = Console::new(transcript.clone(), config.render.serialize);
    let server = HttpServer::new(config, console).unwrap();

    let shutdown = Shutdown::new();
    let listener = TcpListener::bind(proxy_addr).await.unwrap();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    TestProxy {
        addr: proxy_addr,
        transcript,
        shutdown,
    }
}

/// Client that talks to the proxy directly, without pooling.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
