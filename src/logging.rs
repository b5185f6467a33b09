//! Structured logging for internal diagnostics, built on `tracing`.
//!
//! The subscriber configured here is the pluggable diagnostics sink: embed
//! the agent with a different subscriber already installed and this init
//! backs off.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::error::AgentError;

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error, off
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: json, text (default: text)
    #[serde(default = "default_format")]
    pub format: String,

    /// Log file path; stdout when unset
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "text".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_format(),
            file: None,
        }
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.format != "json" && self.format != "text" {
            return Err(format!(
                "invalid log format: {} (must be 'json' or 'text')",
                self.format
            ));
        }
        Ok(())
    }
}

/// Initialize the logging system.
///
/// Priority order (highest to lowest): `TETHER_LOG` environment variable,
/// configuration, defaults. Returns an error when a global subscriber is
/// already installed; callers may treat that as non-fatal.
pub fn init_logging(config: Option<&LoggingConfig>) -> Result<(), AgentError> {
    let filter = build_env_filter(config);

    let format = config.map(|c| c.format.as_str()).unwrap_or("text");
    if format != "json" && format != "text" {
        return Err(AgentError::Config(format!("invalid log format: {format}")));
    }

    let base_subscriber = Registry::default().with(filter);

    let file_writer = match config.and_then(|c| c.file.as_ref()) {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    AgentError::Config(format!("failed to create log directory: {e}"))
                })?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| AgentError::Config(format!("failed to open log file {path:?}: {e}")))?;
            Some(file)
        }
        None => None,
    };

    let init_result = match (format, file_writer) {
        ("json", Some(file)) => base_subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_writer(file),
            )
            .try_init(),
        ("json", None) => base_subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_writer(std::io::stdout),
            )
            .try_init(),
        (_, Some(file)) => base_subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(false)
                    .with_writer(file),
            )
            .try_init(),
        (_, None) => base_subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_writer(std::io::stdout),
            )
            .try_init(),
    };

    init_result.map_err(|e| AgentError::Logging(e.to_string()))
}

fn build_env_filter(config: Option<&LoggingConfig>) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_env("TETHER_LOG") {
        return filter;
    }
    let level = config.map(|c| c.level.as_str()).unwrap_or("info");
    EnvFilter::new(level)
}
