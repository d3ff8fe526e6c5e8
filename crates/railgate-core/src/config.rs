//! Configuration management for the railgate engine
//!
//! Settings load from layered sources: defaults, a configuration file
//! (TOML, JSON, or YAML), and `RAILGATE__`-prefixed environment variables.
//! Validation profiles themselves live with the engine crate; this module
//! only carries the process-level settings that say where to find them and
//! how to log.

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration for a railgate process
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Logging configuration
    pub logging: LoggingConfig,

    /// Engine settings
    pub engine: EngineSettings,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON-formatted log lines
    #[serde(default)]
    pub json: bool,
}

/// Engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Directory holding validation profile files
    #[serde(default = "default_profile_dir")]
    pub profile_dir: String,

    /// Profile applied when a request names none
    #[serde(default = "default_profile_name")]
    pub default_profile: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_profile_dir() -> String {
    "profiles".to_string()
}

fn default_profile_name() -> String {
    "default".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig {
                level: default_log_level(),
                json: false,
            },
            engine: EngineSettings {
                profile_dir: default_profile_dir(),
                default_profile: default_profile_name(),
            },
        }
    }
}

/// Load configuration from a file, layering environment overrides on top.
///
/// File format is inferred from the extension.
///
/// # Example
///
/// ```no_run
/// use railgate_core::config::load_config;
///
/// let config = load_config("railgate.toml").unwrap();
/// println!("default profile: {}", config.engine.default_profile);
/// ```
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<EngineConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(EngineError::config(format!(
            "Config file not found: {}",
            path.display()
        )));
    }

    let settings = config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(config::Environment::with_prefix("RAILGATE").separator("__"))
        .build()?;

    let config: EngineConfig = settings.try_deserialize()?;

    tracing::info!("Configuration loaded from {}", path.display());

    Ok(config)
}

/// Load configuration, falling back to defaults when the file is absent or
/// malformed. Useful for optional configuration files.
pub fn load_config_or_default<P: AsRef<Path>>(path: P) -> EngineConfig {
    match load_config(path) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            EngineConfig::default()
        }
    }
}
