// ABOUTME: Engine configuration loaded from YAML files and environment variables
// ABOUTME: Also installs the tracing subscriber used by applications embedding the engine

pub mod error;
pub mod logging;
pub mod settings;

pub use error::{ConfigError, Result};
pub use logging::init_logging;
pub use settings::{EngineConfig, LogFormat, LoggingConfig};
