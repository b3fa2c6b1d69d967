//! Logging infrastructure for liftplan.
//!
//! The library only emits `tracing` events; the embedding application
//! decides whether and how to install a subscriber. These helpers install a
//! compact formatter whose filter comes from `RUST_LOG` when set, otherwise
//! from the `[logging]` config section.

use crate::config::LoggingConfig;
use crate::{Error, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize logging at INFO, overridable with RUST_LOG
pub fn init() -> Result<()> {
    init_from_config(&LoggingConfig::default())
}

/// Initialize logging with a specific default level or directive string
/// such as `"warn,liftplan_core=debug"`
pub fn init_with_level(default_level: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => filter_for(default_level)?,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init()
        .map_err(|e| Error::Config(format!("Failed to install logger: {}", e)))
}

/// Initialize logging from the `[logging]` section
pub fn init_from_config(config: &LoggingConfig) -> Result<()> {
    init_with_level(&config.level)
}

/// Parse a filter directive string, reporting bad input as a config error
pub fn filter_for(directives: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(directives)
        .map_err(|e| Error::Config(format!("Invalid log level '{}': {}", directives, e)))
}

/// Initialize logging for testing (captures logs for test output)
#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new("liftplan_core=debug"))
        .try_init();
}
