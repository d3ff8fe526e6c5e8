//! Railgate Core
//!
//! Foundation crate for the railgate validation engine: error handling,
//! configuration loading, and logging setup shared by the engine crates.

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::{load_config, load_config_or_default, EngineConfig};
pub use error::{EngineError, Result};
pub use logging::init_logging;
