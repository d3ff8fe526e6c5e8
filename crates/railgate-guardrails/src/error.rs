//! Error types for the guardrail engine

use railgate_core::EngineError;

/// Result type for guardrail operations
pub type Result<T> = std::result::Result<T, GuardrailError>;

/// Errors that can occur while building or running guardrails
#[derive(Debug, thiserror::Error)]
pub enum GuardrailError {
    /// Invalid guardrail configuration, raised at construction time
    #[error("Invalid guardrail configuration: {0}")]
    Config(String),

    /// A guardrail name that no factory is registered for
    #[error("Unknown guardrail: {0}")]
    UnknownGuardrail(String),

    /// Unexpected failure inside a guardrail's execute path
    #[error("Guardrail execution failed: {0}")]
    Execution(String),

    /// A pattern in a guardrail's configuration failed to compile
    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Generic error from railgate-core
    #[error(transparent)]
    CoreError(#[from] EngineError),
}

impl GuardrailError {
    /// Create a configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create an execution error
    pub fn execution<S: Into<String>>(msg: S) -> Self {
        Self::Execution(msg.into())
    }
}
