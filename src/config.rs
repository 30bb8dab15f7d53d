//! Configuration system.
//!
//! Hierarchical configuration with environment variable overrides: file
//! values are overridden by `PARLEY_`-prefixed environment variables,
//! which are overridden by whatever the caller sets programmatically.

use crate::error::CompileError;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParleyConfig {
    /// Namespace prefixed to every synthesized translation key.
    #[serde(default = "default_key_namespace")]
    pub key_namespace: String,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_key_namespace() -> String {
    "runtime".to_string()
}

impl Default for ParleyConfig {
    fn default() -> Self {
        Self {
            key_namespace: default_key_namespace(),
            logging: LoggingConfig::default(),
        }
    }
}

impl ParleyConfig {
    /// Load configuration from an optional file plus `PARLEY_*` environment
    /// overrides (e.g. `PARLEY_KEY_NAMESPACE`, `PARLEY_LOGGING__LEVEL`).
    pub fn load(path: Option<&Path>) -> Result<Self, CompileError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder
                .add_source(config::File::with_name(&path.to_string_lossy()).required(false));
        }
        let settings = builder
            .add_source(
                config::Environment::with_prefix("PARLEY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        let config = settings.try_deserialize()?;
        Ok(config)
    }
}
