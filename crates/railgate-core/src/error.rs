//! Error types shared across the railgate engine
//!
//! Configuration errors are raised while a pipeline is being assembled and
//! never reach the per-request path; everything else is wrapped so callers
//! can propagate with `?`.

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Main error type for the railgate engine
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Invalid engine or profile configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration file parsing errors
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] config::ConfigError),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl EngineError {
    /// Create a configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Self::Other(msg.into())
    }
}
