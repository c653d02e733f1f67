//! Subscriber setup for the `openapi-guard` binary.
//!
//! The library only emits `tracing` events; installing a subscriber is left to
//! the embedding application. The binary calls [`init_logging`] once at start.
//!
//! | Variable | Meaning | Default |
//! |---|---|---|
//! | `RUST_LOG` | `EnvFilter` directives | `warn` |
//! | `OAG_LOG_FORMAT` | `text` or `json` | `text` |
//!
//! Events go to stderr so command output on stdout stays machine-readable.

use anyhow::Context;
use std::env;
use tracing_subscriber::EnvFilter;

/// Output format of log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    fn parse(val: &str) -> Self {
        if val.trim().eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

/// Logging configuration for the binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Fallback filter when `RUST_LOG` is unset or invalid
    pub default_level: String,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            default_level: "warn".to_string(),
            format: LogFormat::Text,
        }
    }
}

impl LogConfig {
    pub fn from_env() -> Self {
        Self {
            format: env::var("OAG_LOG_FORMAT")
                .map(|v| LogFormat::parse(&v))
                .unwrap_or_default(),
            ..Self::default()
        }
    }
}

/// Install the global subscriber.
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_level.as_str()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    match config.format {
        LogFormat::Json => builder
            .json()
            .with_current_span(true)
            .try_init()
            .map_err(|e| anyhow::anyhow!("{e}"))
            .context("Failed to initialize JSON logging"),
        LogFormat::Text => builder
            .try_init()
            .map_err(|e| anyhow::anyhow!("{e}"))
            .context("Failed to initialize logging"),
    }
}
