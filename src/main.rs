//! wtf-proxy
//!
//! Forwards every request to one upstream and prints each request and
//! response to stdout as it passes through.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request      ┌───────────────────────────────────────────────┐
//!     ────────────────────┼─▶ net ──▶ http server ──▶ capture (request)   │
//!                         │                                │             │
//!                         │                      console ◀─┤ render      │
//!                         │                                ▼             │
//!     Client Response     │                        http upstream ────────┼──▶ Upstream
//!     ◀───────────────────┼── capture (response) ◀──────────┘            │
//!                         └───────────────────────────────────────────────┘
//! ```

use std::io::IsTerminal;

use clap::Parser;

use wtf_proxy::cli::Cli;
use wtf_proxy::console::Console;
use wtf_proxy::http::HttpServer;
use wtf_proxy::lifecycle::{spawn_signal_handler, Shutdown};
use wtf_proxy::net;
use wtf_proxy::observability::init_logging;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let cli_level = cli.log_level.clone();
    let loaded = cli.into_config();

    // The file may set the level, but a broken file still needs a logger.
    let level = match &loaded {
        Ok(config) => config.observability.log_level.clone(),
        Err(_) => cli_level.unwrap_or_else(|| "info".to_string()),
    };
    init_logging(&level);

    let mut config = match loaded {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            std::process::exit(2);
        }
    };
    config.render.resolve_colors(std::io::stdout().is_terminal());

    tracing::info!(
        listen = %config.listener.bind_address,
        upstream = %config.upstream.target,
        colors = config.render.colors,
        serialize = config.render.serialize,
        short_headers = config.render.short_headers,
        max_body = config.render.max_body,
        "wtf-proxy v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    let listener = match net::bind(&config.listener).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, "Failed to start listener");
            std::process::exit(1);
        }
    };

    let console = Console::stdout(config.render.serialize);
    let server = HttpServer::new(config, console)?;

    let shutdown = Shutdown::new();
    spawn_signal_handler(shutdown.clone());
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
