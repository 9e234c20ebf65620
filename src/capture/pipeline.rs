//! Request and response interception hooks.
//!
//! # Responsibilities
//! - Assign a correlation identifier to each intercepted request
//! - Snapshot bodies without disturbing what gets forwarded
//! - Render request and response transcript blocks
//! - Point requests at the upstream and stamp the correlation header
//!
//! # Exchange States
//! ```text
//! on_request_intercepted ──▶ Intercepted ──▶ on_response_intercepted (Forwarded)
//!                                  │
//!                                  └──────▶ on_exchange_failed (orphaned)
//! ```
//!
//! The request hook returns an [`Exchange`] token. It carries the identifier
//! and, in serialized mode, the console's exchange permit. Whichever hook
//! consumes the token ends the exchange and releases the permit.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{header, response, HeaderValue, Method, Request, Response, Uri};
use hyper::ext::ReasonPhrase;

use crate::capture::correlation::{CorrelationCounter, CorrelationId, CORRELATION_HEADER};
use crate::capture::snapshot::snapshot_body;
use crate::config::RenderConfig;
use crate::console::{Console, ExchangePermit, TranscriptBlock};
use crate::http::upstream::UpstreamTarget;
use crate::render::{BodyRenderer, Color, ContentSniffer, ExtraHeaders, HeaderFormatter, MagicSniffer, Painter};

const REQUEST_COLOR: Color = Color::Blue;
const SUCCESS_COLOR: Color = Color::Green;
const ERROR_COLOR: Color = Color::Red;

/// An intercepted request waiting for its response.
#[derive(Debug)]
pub struct Exchange {
    id: CorrelationId,
    started: Instant,
    permit: ExchangePermit,
}

impl Exchange {
    pub fn id(&self) -> CorrelationId {
        self.id
    }

    /// Time since the request hook ran.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Whether this exchange holds the serialized-output lock.
    pub fn is_exclusive(&self) -> bool {
        self.permit.is_exclusive()
    }
}

/// Captures traffic passing through the proxy and writes its transcript.
pub struct CapturePipeline {
    config: Arc<RenderConfig>,
    upstream: UpstreamTarget,
    console: Console,
    ids: CorrelationCounter,
    painter: Painter,
    headers: HeaderFormatter,
    bodies: BodyRenderer,
}

impl CapturePipeline {
    /// Build a pipeline with the default content sniffer.
    pub fn new(config: Arc<RenderConfig>, upstream: UpstreamTarget, console: Console) -> Self {
        Self::with_sniffer(config, upstream, console, Arc::new(MagicSniffer))
    }

    pub fn with_sniffer(
        config: Arc<RenderConfig>,
        upstream: UpstreamTarget,
        console: Console,
        sniffer: Arc<dyn ContentSniffer>,
    ) -> Self {
        Self {
            painter: Painter::new(config.colors),
            headers: HeaderFormatter::new(&config),
            bodies: BodyRenderer::new(&config, sniffer),
            ids: CorrelationCounter::new(),
            config,
            upstream,
            console,
        }
    }

    pub fn upstream(&self) -> &UpstreamTarget {
        &self.upstream
    }

    /// Request hook. Runs once per inbound request, before anything is sent upstream.
    pub async fn on_request_intercepted(&self, request: Request<Body>) -> (Request<Body>, Exchange) {
        // Taken before any observable work so no other transcript can slip in.
        let permit = self.console.begin_exchange().await;
        let id = self.ids.next_id();
        let started = Instant::now();

        let (mut parts, body) = request.into_parts();

        let mut block = TranscriptBlock::new();
        block.push(self.request_status_line(id, &parts.method, &parts.uri));

        let host = parts
            .headers
            .remove(header::HOST)
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
            .or_else(|| parts.uri.authority().map(|a| a.to_string()))
            .unwrap_or_default();
        let mut extra = ExtraHeaders::new();
        extra.insert("Host".to_string(), vec![host]);
        block.extend(self.headers.format(&parts.headers, &extra, REQUEST_COLOR));
        block.blank();

        let body = self.capture_body(id, "request", body, REQUEST_COLOR, &mut block).await;

        parts.uri = self.upstream.rewrite(&parts.uri);
        if let Ok(host) = HeaderValue::from_str(self.upstream.authority().as_str()) {
            parts.headers.insert(header::HOST, host);
        }
        parts.headers.insert(CORRELATION_HEADER.clone(), id.to_header_value());

        self.console.emit(&block);

        tracing::debug!(
            correlation_id = %id,
            method = %parts.method,
            uri = %parts.uri,
            "Request intercepted"
        );

        (
            Request::from_parts(parts, body),
            Exchange {
                id,
                started,
                permit,
            },
        )
    }

    /// Response hook. Runs once per completed round trip and always hands
    /// the response back.
    pub async fn on_response_intercepted(&self, exchange: Exchange, response: Response<Body>) -> Response<Body> {
        let (parts, body) = response.into_parts();
        let color = if parts.status.as_u16() >= 400 {
            ERROR_COLOR
        } else {
            SUCCESS_COLOR
        };

        let mut block = TranscriptBlock::new();
        block.push(self.response_status_line(exchange.id, color, &status_text(&parts)));
        block.extend(self.headers.format(&parts.headers, &ExtraHeaders::new(), color));
        block.blank();

        let body = self.capture_body(exchange.id, "response", body, color, &mut block).await;

        self.console.emit(&block);

        tracing::debug!(
            correlation_id = %exchange.id,
            status = parts.status.as_u16(),
            elapsed_ms = exchange.elapsed().as_millis() as u64,
            "Response intercepted"
        );

        drop(exchange);
        Response::from_parts(parts, body)
    }

    /// Transport failure hook. The request transcript stays without a
    /// matching response; the exchange permit is released.
    pub fn on_exchange_failed<E: fmt::Display + ?Sized>(&self, exchange: Exchange, error: &E) {
        tracing::warn!(
            correlation_id = %exchange.id,
            elapsed_ms = exchange.elapsed().as_millis() as u64,
            serialized = exchange.is_exclusive(),
            error = %error,
            "Upstream exchange failed, no response transcript"
        );
    }

    async fn capture_body(
        &self,
        id: CorrelationId,
        direction: &'static str,
        body: Body,
        color: Color,
        block: &mut TranscriptBlock,
    ) -> Body {
        let (replay, captured) = snapshot_body(body).await;
        match captured {
            Ok(bytes) => {
                block.extend(self.bodies.content_type_lines(&bytes, color));
                block.extend(self.bodies.body_lines(&bytes));
            }
            Err(e) => {
                tracing::warn!(correlation_id = %id, direction, error = %e, "Body capture failed");
            }
        }
        replay
    }

    fn request_status_line(&self, id: CorrelationId, method: &Method, uri: &Uri) -> String {
        let target = uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| uri.to_string());

        if self.painter.enabled() {
            format!(
                "{} {} {}",
                self.painter.badge(REQUEST_COLOR, &format!(" {id} ")),
                self.painter.bright(REQUEST_COLOR, method.as_str()),
                self.painter.text(REQUEST_COLOR, &target)
            )
        } else {
            format!("{id} {method} {target}")
        }
    }

    fn response_status_line(&self, id: CorrelationId, color: Color, status: &str) -> String {
        if self.painter.enabled() {
            format!(
                "{} {}",
                self.painter.badge(color, &format!(" {id} ")),
                self.painter.bright(color, status)
            )
        } else {
            format!("{id} {status}")
        }
    }
}

/// Status code and reason as the upstream sent them.
///
/// hyper records a reason phrase only when it differs from the canonical one.
fn status_text(parts: &response::Parts) -> String {
    let reason = parts
        .extensions
        .get::<ReasonPhrase>()
        .map(|reason| String::from_utf8_lossy(reason.as_bytes()).into_owned())
        .or_else(|| parts.status.canonical_reason().map(str::to_string));

    match reason {
        Some(reason) => format!("{} {}", parts.status.as_u16(), reason),
        None => parts.status.as_u16().to_string(),
    }
}

impl fmt::Debug for CapturePipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapturePipeline")
            .field("upstream", &self.upstream)
            .field("config", &self.config)
            .field("issued", &self.ids.issued())
            .field("console", &self.console)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::snapshot::ResetBody;
    use crate::console::MemorySink;
    use axum::body::to_bytes;
    use std::time::Duration;

    fn pipeline(config: RenderConfig) -> (CapturePipeline, MemorySink) {
        let sink = MemorySink::new();
        let console = Console::new(sink.clone(), config.serialize);
        let upstream = UpstreamTarget::parse("https://upstream.test:8443").unwrap();
        (CapturePipeline::new(Arc::new(config), upstream, console), sink)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder()
            .method(Method::GET)
            .uri(uri)
            .header("host", "localhost:8080")
            .header("accept", "*/*")
            .body(Body::empty())
            .unwrap()
    }

    fn response(status: u16, content_type: &str, body: &'static str) -> Response<Body> {
        Response::builder()
            .status(status)
            .header("content-type", content_type)
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_request_transcript() {
        let (pipeline, sink) = pipeline(RenderConfig::default());
        let (_, exchange) = pipeline.on_request_intercepted(get("/foo?bar=1")).await;

        assert_eq!(exchange.id().as_u64(), 1);
        assert_eq!(
            sink.contents(),
            "1 GET /foo?bar=1\nAccept: */*\nHost: localhost:8080\n\n"
        );
    }

    #[tokio::test]
    async fn test_short_mode_hides_accept_but_keeps_request_line() {
        let config = RenderConfig {
            short_headers: true,
            ..RenderConfig::default()
        };
        let (pipeline, sink) = pipeline(config);
        pipeline.on_request_intercepted(get("/foo")).await;

        let contents = sink.contents();
        assert!(contents.starts_with("1 GET /foo\n"));
        assert!(!contents.contains("Accept"));
        assert!(contents.contains("Host: localhost:8080"));
    }

    #[tokio::test]
    async fn test_request_is_rewritten_and_stamped() {
        let (pipeline, _) = pipeline(RenderConfig::default());
        let (forwarded, exchange) = pipeline.on_request_intercepted(get("/foo?bar=1")).await;

        assert_eq!(forwarded.uri().to_string(), "https://upstream.test:8443/foo?bar=1");
        assert_eq!(forwarded.headers()[header::HOST], "upstream.test:8443");
        assert_eq!(CorrelationId::from_headers(forwarded.headers()), Some(exchange.id()));
        assert_eq!(forwarded.headers()["accept"], "*/*");
    }

    #[tokio::test]
    async fn test_request_body_is_replayed_byte_for_byte() {
        let (pipeline, sink) = pipeline(RenderConfig::default());
        let payload: Vec<u8> = (0u8..=255).cycle().take(5000).collect();
        let request = Request::builder()
            .method(Method::POST)
            .uri("/upload")
            .body(Body::from(payload.clone()))
            .unwrap();

        let (forwarded, _) = pipeline.on_request_intercepted(request).await;
        let forwarded = to_bytes(forwarded.into_body(), usize::MAX).await.unwrap();

        assert_eq!(forwarded.as_ref(), payload.as_slice());
        assert!(sink.contents().contains("(trimmed 3976 bytes)"));
    }

    #[tokio::test]
    async fn test_response_transcript_json() {
        let (pipeline, sink) = pipeline(RenderConfig::default());
        let (_, exchange) = pipeline.on_request_intercepted(get("/a")).await;
        let before = sink.contents();

        let res = pipeline
            .on_response_intercepted(exchange, response(200, "application/json", r#"{"a":1}"#))
            .await;

        let block = sink.contents()[before.len()..].to_string();
        assert_eq!(
            block,
            "1 200 OK\nContent-Type: application/json\n\napplication/json\n\n{\"a\":1}\n\n"
        );
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body.as_ref(), br#"{"a":1}"#);
    }

    #[tokio::test]
    async fn test_response_status_colors() {
        let config = RenderConfig {
            colors: true,
            ..RenderConfig::default()
        };
        let (pipeline, sink) = pipeline(config);

        let (_, ok) = pipeline.on_request_intercepted(get("/ok")).await;
        pipeline.on_response_intercepted(ok, response(204, "text/plain", "")).await;
        let (_, missing) = pipeline.on_request_intercepted(get("/missing")).await;
        pipeline.on_response_intercepted(missing, response(404, "text/plain", "")).await;

        let contents = sink.contents();
        assert!(contents.contains("\x1b[30;44m 1 \x1b[m \x1b[1;34mGET\x1b[m \x1b[34m/ok\x1b[m\n"));
        assert!(contents.contains("\x1b[30;42m 1 \x1b[m \x1b[1;32m204 No Content\x1b[m\n"));
        assert!(contents.contains("\x1b[30;41m 2 \x1b[m \x1b[1;31m404 Not Found\x1b[m\n"));
    }

    #[tokio::test]
    async fn test_identifiers_strictly_increase() {
        let (pipeline, _) = pipeline(RenderConfig::default());
        let mut ids = Vec::new();
        for _ in 0..20 {
            let (_, exchange) = pipeline.on_request_intercepted(get("/")).await;
            ids.push(exchange.id().as_u64());
            pipeline.on_exchange_failed(exchange, &"test");
        }
        assert_eq!(ids, (1..=20).collect::<Vec<_>>());
    }

    async fn put_and_reply(p: &CapturePipeline) {
        let request = Request::builder()
            .method(Method::PUT)
            .uri("/item/7")
            .header("content-type", "application/json")
            .header("x-trace", "abc")
            .body(Body::from(r#"{"name":"widget","tags":["a","b"]}"#))
            .unwrap();
        let (_, exchange) = p.on_request_intercepted(request).await;
        p.on_response_intercepted(exchange, response(201, "text/plain", "created\n")).await;
    }

    #[tokio::test]
    async fn test_rendering_is_idempotent_across_pipelines() {
        let (a, sink_a) = pipeline(RenderConfig::default());
        let (b, sink_b) = pipeline(RenderConfig::default());
        put_and_reply(&a).await;
        put_and_reply(&b).await;
        assert_eq!(sink_a.contents(), sink_b.contents());
        assert!(sink_a.contents().contains("{\"name\":\"widget\",\"tags\":[\"a\",\"b\"]}"));
    }

    #[tokio::test]
    async fn test_serialized_exchange_blocks_next_request() {
        let config = RenderConfig {
            serialize: true,
            ..RenderConfig::default()
        };
        let (pipeline, sink) = pipeline(config);
        let pipeline = Arc::new(pipeline);

        let (_, first) = pipeline.on_request_intercepted(get("/a")).await;
        assert!(first.is_exclusive());

        let second = {
            let pipeline = pipeline.clone();
            tokio::spawn(async move {
                let (_, exchange) = pipeline.on_request_intercepted(get("/b")).await;
                pipeline
                    .on_response_intercepted(exchange, response(200, "text/plain", "b"))
                    .await;
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!sink.contents().contains("GET /b"), "second request must wait");

        pipeline.on_response_intercepted(first, response(200, "text/plain", "a")).await;
        second.await.unwrap();

        let contents = sink.contents();
        let a_response = contents.find("1 200 OK").unwrap();
        let b_request = contents.find("2 GET /b").unwrap();
        assert!(a_response < b_request);
    }

    #[tokio::test]
    async fn test_failed_exchange_releases_serialized_lock() {
        let config = RenderConfig {
            serialize: true,
            ..RenderConfig::default()
        };
        let (pipeline, _) = pipeline(config);

        let (_, first) = pipeline.on_request_intercepted(get("/a")).await;
        pipeline.on_exchange_failed(first, &"connection refused");

        let next = tokio::time::timeout(Duration::from_millis(500), pipeline.on_request_intercepted(get("/b")))
            .await
            .expect("lock should be free after a failed exchange");
        assert_eq!(next.1.id().as_u64(), 2);
    }

    #[tokio::test]
    async fn test_unreadable_request_body_still_forwarded() {
        let (pipeline, sink) = pipeline(RenderConfig::default());
        let request = Request::builder()
            .method(Method::POST)
            .uri("/upload")
            .header("host", "localhost:8080")
            .body(Body::new(ResetBody))
            .unwrap();

        let (forwarded, exchange) = pipeline.on_request_intercepted(request).await;

        // headers are printed, the body section is skipped
        assert_eq!(sink.contents(), "1 POST /upload\nHost: localhost:8080\n\n");
        assert_eq!(forwarded.uri().to_string(), "https://upstream.test:8443/upload");
        assert_eq!(CorrelationId::from_headers(forwarded.headers()), Some(exchange.id()));
        let body = to_bytes(forwarded.into_body(), usize::MAX).await.unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_response_body_still_returned() {
        let (pipeline, sink) = pipeline(RenderConfig::default());
        let (_, exchange) = pipeline.on_request_intercepted(get("/a")).await;
        let before = sink.contents();

        let upstream = Response::builder().status(200).body(Body::new(ResetBody)).unwrap();
        let res = pipeline.on_response_intercepted(exchange, upstream).await;

        assert_eq!(res.status(), 200);
        assert_eq!(&sink.contents()[before.len()..], "1 200 OK\n\n");
    }

    #[tokio::test]
    async fn test_upstream_reason_phrase_kept() {
        let (pipeline, sink) = pipeline(RenderConfig::default());

        let (_, custom) = pipeline.on_request_intercepted(get("/a")).await;
        let mut res = response(200, "text/plain", "");
        res.extensions_mut().insert(ReasonPhrase::from_static(b"Totally Fine"));
        pipeline.on_response_intercepted(custom, res).await;

        let (_, unknown) = pipeline.on_request_intercepted(get("/b")).await;
        pipeline.on_response_intercepted(unknown, response(299, "text/plain", "")).await;

        let contents = sink.contents();
        assert!(contents.contains("1 200 Totally Fine\n"));
        assert!(contents.contains("2 299\n"));
    }
}
