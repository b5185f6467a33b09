//! Install-time configuration.
//!
//! Read once at startup from layered sources: built-in defaults, an optional
//! TOML file, then `TETHER_`-prefixed environment variables. The recognized
//! options are deliberately few; the agent is configured by the embedding
//! process, not at runtime.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::AgentError;
use crate::logging::LoggingConfig;

/// Root agent configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Path checked for the kill-switch sentinel file at install time.
    /// Interception is disabled for the process lifetime when it exists.
    #[serde(default)]
    pub kill_switch_path: Option<PathBuf>,

    /// When true, supporting state loads but no interception logic runs.
    /// Used when a build-time pass already instrumented the target and a
    /// second, runtime instrumentation must not re-apply the same hooks.
    #[serde(default)]
    pub dependency_provider_only: bool,

    /// Internal diagnostics configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AgentConfig {
    /// Load configuration: defaults, then the optional file, then
    /// environment overrides (`TETHER_DEPENDENCY_PROVIDER_ONLY`,
    /// `TETHER_KILL_SWITCH_PATH`, ...).
    pub fn load(file: Option<&Path>) -> Result<Self, AgentError> {
        let mut builder = config::Config::builder();
        if let Some(file) = file {
            builder = builder.add_source(
                config::File::from(file.to_path_buf()).format(config::FileFormat::Toml),
            );
        }
        builder = builder.add_source(config::Environment::with_prefix("TETHER"));

        let settings = builder
            .build()
            .map_err(|e| AgentError::Config(e.to_string()))?;
        let config: AgentConfig = settings
            .try_deserialize()
            .map_err(|e| AgentError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AgentError> {
        if let Some(path) = &self.kill_switch_path {
            if path.as_os_str().is_empty() {
                return Err(AgentError::Config(
                    "kill_switch_path cannot be empty".to_string(),
                ));
            }
        }
        self.logging.validate().map_err(AgentError::Config)
    }
}
