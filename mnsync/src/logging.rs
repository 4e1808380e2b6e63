//! Tracing setup for binaries embedding the sync manager.
//!
//! Library code only emits `tracing` events; installing a subscriber is
//! the embedder's call. This module is the one-line default for tools and
//! tests that want output without wiring `tracing-subscriber` themselves.

use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset, e.g. `"info"` or
    /// `"dash_mnsync=debug,dash_sml=info"`.
    pub default_level: String,
    /// Include the event's module path in each line.
    pub show_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            default_level: "info".to_string(),
            show_target: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter directive: {0}")]
    InvalidFilter(String),
    #[error("a global tracing subscriber is already installed")]
    AlreadyInitialized,
}

/// Keeps the subscriber installed. Dropping it has no effect today; it
/// exists so a flush guard can be added without changing callers.
pub struct LoggingGuard {
    _private: (),
}

/// Installs a global `tracing` subscriber. `RUST_LOG` overrides the
/// configured default filter.
pub fn init_logging(config: &LoggingConfig) -> Result<LoggingGuard, LoggingError> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| {
        EnvFilter::try_new(&config.default_level)
            .map_err(|error| LoggingError::InvalidFilter(error.to_string()))
    })?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.show_target)
        .try_init()
        .map_err(|_| LoggingError::AlreadyInitialized)?;

    Ok(LoggingGuard { _private: () })
}
