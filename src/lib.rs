//! Transparent HTTP intercepting proxy that prints a transcript of every
//! exchange it forwards.

pub mod capture;
pub mod cli;
pub mod config;
pub mod console;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod render;

pub use capture::CapturePipeline;
pub use config::schema::ProxyConfig;
pub use console::Console;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
