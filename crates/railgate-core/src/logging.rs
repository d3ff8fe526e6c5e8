//! Logging setup for the railgate engine
//!
//! Structured logging via `tracing`. Every guardrail decision of interest
//! is emitted as an event, so the subscriber installed here is the audit
//! surface for operators.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Initialize logging for the process.
///
/// Respects `RUST_LOG` when set; otherwise uses the configured level.
/// Call once at startup.
///
/// # Example
///
/// ```
/// use railgate_core::config::LoggingConfig;
/// use railgate_core::logging::init_logging;
///
/// init_logging(LoggingConfig { level: "debug".to_string(), json: false });
/// ```
pub fn init_logging(config: LoggingConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    if config.json {
        // JSON lines for production log shipping
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json())
            .try_init()
            .ok();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().pretty())
            .try_init()
            .ok();
    }

    tracing::info!("Logging initialized at level: {}", config.level);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        let config = LoggingConfig {
            level: "warn".to_string(),
            json: false,
        };
        // try_init tolerates an already-installed subscriber
        init_logging(config.clone());
        init_logging(config);
    }
}
