//! Command-line interface.
//!
//! Every option is optional so that values from `--config` survive unless
//! the command line names them explicitly.

use std::path::PathBuf;

use clap::Parser;

use crate::config::loader::read_config;
use crate::config::validation::validate_config;
use crate::config::{ColorMode, ConfigError, ProxyConfig};

#[derive(Debug, Parser)]
#[command(name = "wtf-proxy")]
#[command(about = "Transparent HTTP proxy that prints every request and response it forwards", long_about = None)]
pub struct Cli {
    /// Address to listen on (`:8080` listens on all interfaces)
    #[arg(value_name = "LISTEN")]
    pub listen: Option<String>,

    /// Upstream to forward to (`host:port`, optionally prefixed by `http://` or `https://`)
    #[arg(value_name = "TARGET")]
    pub target: Option<String>,

    /// Hide noisy headers and abbreviate long header values
    #[arg(long)]
    pub short: bool,

    /// Print each response right after its request, one exchange at a time
    #[arg(long)]
    pub serialize: bool,

    /// Maximum body bytes to print [default: 1024]
    #[arg(long, value_name = "BYTES")]
    pub maxbody: Option<usize>,

    /// Header values longer than this are abbreviated with --short [default: 64]
    #[arg(long, value_name = "BYTES")]
    pub maxheader: Option<usize>,

    /// When to color the transcript [default: auto]
    #[arg(long, value_enum)]
    pub color: Option<ColorMode>,

    /// TOML configuration file; command-line values take precedence
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log filter for diagnostics on stderr (e.g. `debug` or `wtf_proxy=trace`)
    #[arg(long, value_name = "FILTER")]
    pub log_level: Option<String>,
}

impl Cli {
    /// Load the configuration file (if any), overlay command-line values and validate.
    pub fn into_config(self) -> Result<ProxyConfig, ConfigError> {
        let base = match &self.config {
            Some(path) => read_config(path)?,
            None => ProxyConfig::default(),
        };
        let config = self.overlay(base);
        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }

    /// Apply explicitly given command-line values on top of `config`.
    pub fn overlay(self, mut config: ProxyConfig) -> ProxyConfig {
        if let Some(listen) = self.listen {
            config.listener.bind_address = listen;
        }
        if let Some(target) = self.target {
            config.upstream.target = target;
        }
        if self.short {
            config.render.short_headers = true;
        }
        if self.serialize {
            config.render.serialize = true;
        }
        if let Some(max_body) = self.maxbody {
            config.render.max_body = max_body;
        }
        if let Some(max_header) = self.maxheader {
            config.render.max_header = max_header;
        }
        if let Some(color) = self.color {
            config.render.color = color;
        }
        if let Some(level) = self.log_level {
            config.observability.log_level = level;
        }
        config
    }
}
