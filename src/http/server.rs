//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the proxy handler
//! - Wire up middleware (tracing)
//! - Run every request through the capture pipeline
//! - Forward requests to the upstream and answer 502 on transport failure

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::capture::CapturePipeline;
use crate::config::ProxyConfig;
use crate::console::Console;
use crate::http::upstream::{TargetError, UpstreamClient, UpstreamTarget};

/// Error type for server setup and serving.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid upstream target: {0}")]
    Target(#[from] TargetError),

    #[error("server I/O: {0}")]
    Io(#[from] std::io::Error),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<CapturePipeline>,
    pub upstream: UpstreamClient,
}

/// HTTP server for the intercepting proxy.
pub struct HttpServer {
    router: Router,
    pipeline: Arc<CapturePipeline>,
}

impl HttpServer {
    /// Create a new HTTP server writing its transcript to `console`.
    ///
    /// `config.render.colors` must already be resolved.
    pub fn new(config: ProxyConfig, console: Console) -> Result<Self, ServerError> {
        let target = UpstreamTarget::parse(&config.upstream.target)?;
        let upstream = UpstreamClient::new();

        let pipeline = Arc::new(CapturePipeline::new(
            Arc::new(config.render),
            target,
            console,
        ));

        let state = AppState {
            pipeline: pipeline.clone(),
            upstream,
        };

        let router = Self::build_router(state);
        Ok(Self { router, pipeline })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.pipeline.upstream(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The capture pipeline every request passes through.
    pub fn pipeline(&self) -> &Arc<CapturePipeline> {
        &self.pipeline
    }
}

/// Main proxy handler.
/// Captures the request, forwards it upstream and captures the response.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let (outgoing, exchange) = state.pipeline.on_request_intercepted(request).await;

    match state.upstream.forward(outgoing).await {
        Ok(response) => state.pipeline.on_response_intercepted(exchange, response).await,
        Err(e) => {
            tracing::error!(correlation_id = %exchange.id(), error = %e, "Upstream error");
            state.pipeline.on_exchange_failed(exchange, &e);
            (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
        }
    }
}
