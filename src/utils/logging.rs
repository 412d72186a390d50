//! Structured logging setup.
//!
//! The library only emits `tracing` events; installing a subscriber is left to the
//! application. `init_logging` is a convenience for tools that have no logging
//! setup of their own.

use crate::config::LoggingConfig;
use crate::error::{constants, ProtocolError, Result};
use tracing_subscriber::EnvFilter;

/// Build the filter: `RUST_LOG` wins, otherwise the configured level.
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = config.log_level.to_string().to_lowercase();
        EnvFilter::new(format!("photon_protocol={level},{level}"))
    })
}

/// Install a global fmt subscriber configured from `config`.
///
/// Fails if a global subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(config))
        .with_target(true);

    let installed = if config.json_format {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    installed
        .map_err(|e| ProtocolError::LoggingError(format!("{}: {e}", constants::ERR_LOGGING_INIT)))?;

    tracing::info!(app = %config.app_name, "Logging initialized");
    Ok(())
}
