// ABOUTME: Error types for configuration loading and logging setup
// ABOUTME: Covers file IO, YAML parsing, bad environment values, and subscriber install

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid value for {variable}: {value:?} ({reason})")]
    InvalidEnv {
        variable: &'static str,
        value: String,
        reason: String,
    },

    #[error("Invalid log filter {filter:?}: {reason}")]
    InvalidFilter { filter: String, reason: String },

    #[error("Logging already initialized: {0}")]
    LoggingInit(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
