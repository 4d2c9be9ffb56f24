//! Logging configuration and tracing subscriber setup.

use std::env;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Output format for log lines
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

/// Configuration for the tracing subscriber
#[derive(Clone, Debug)]
pub struct TelemetryConfig {
    pub format: LogFormat,
    pub filter: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            filter: "info".to_string(),
        }
    }
}

impl TelemetryConfig {
    /// Load configuration from `LOG_FORMAT` and `RUST_LOG`
    pub fn from_env() -> Self {
        let format = match env::var("LOG_FORMAT").map(|v| v.to_lowercase()).as_deref() {
            Ok("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        let filter = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Self { format, filter }
    }
}

/// Install a global tracing subscriber
///
/// Fails if a global subscriber was already set, e.g. by the host application.
pub fn init_tracing(config: &TelemetryConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_new(&config.filter)?;

    match config.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_current_span(false))
            .try_init()?,
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .try_init()?,
    }

    tracing::info!(
        target: "slack_verify",
        format = ?config.format,
        filter = %config.filter,
        "Tracing initialized"
    );

    Ok(())
}
