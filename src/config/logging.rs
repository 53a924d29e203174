// ABOUTME: Tracing subscriber setup for applications embedding the engine
// ABOUTME: RUST_LOG takes precedence over the configured level

use tracing::debug;
use tracing_subscriber::EnvFilter;

use super::error::{ConfigError, Result};
use super::settings::{LogFormat, LoggingConfig};

/// Install a global `fmt` subscriber. Fails instead of panicking when a
/// subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level).map_err(|e| ConfigError::InvalidFilter {
            filter: config.level.clone(),
            reason: e.to_string(),
        })?,
    };

    let installed = match config.format {
        LogFormat::Compact => tracing_subscriber::fmt()
            .compact()
            .with_env_filter(env_filter)
            .with_target(false)
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .pretty()
            .with_env_filter(env_filter)
            .with_target(false)
            .try_init(),
    };
    installed.map_err(|e| ConfigError::LoggingInit(e.to_string()))?;

    debug!("Logging initialized with level: {}", config.level);
    Ok(())
}
