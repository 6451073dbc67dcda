//! Tracing subscriber setup for the demo programs.
//!
//! Logs go to stderr so stdout carries only program output.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::{LogFormat, LoggingConfig};
use crate::{MapperError, Result};

/// Builds the level filter: `RUST_LOG` when set, otherwise the configured level.
///
/// # Errors
/// Returns `MapperError::InvalidConfig` when the configured level is not a
/// valid filter directive.
pub fn filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.level).map_err(|e| {
        MapperError::InvalidConfig(format!("invalid logging.level '{}': {e}", config.level))
    })
}

/// Installs the global subscriber.
///
/// # Errors
/// Returns an error if the level is invalid or a global subscriber is
/// already installed.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let registry = tracing_subscriber::registry().with(filter(config)?);

    let installed = match config.format {
        LogFormat::Text => registry
            .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
            .try_init(),
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };

    installed.map_err(|e| MapperError::Other(anyhow::anyhow!("failed to install logger: {e}")))
}
