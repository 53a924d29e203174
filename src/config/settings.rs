// ABOUTME: EngineConfig structure with defaults, file discovery, and environment overrides
// ABOUTME: Durations are written as humantime strings such as "30s" or "1h 30m"

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::error::{ConfigError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Finished instances kept for status queries before the oldest are dropped.
    pub max_retained_instances: usize,

    #[serde(with = "humantime_serde")]
    pub instance_ttl: Option<Duration>,

    /// Applied to tasks that declare no timeout of their own.
    #[serde(with = "humantime_serde")]
    pub default_task_timeout: Option<Duration>,

    pub enforce_timeouts: bool,

    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,

    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Compact,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_retained_instances: 1000,
            instance_ttl: None,
            default_task_timeout: None,
            enforce_timeouts: true,
            poll_interval: Duration::from_millis(50),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

impl EngineConfig {
    /// Load configuration from the given path or the default locations, then
    /// apply environment overrides. A missing file means defaults.
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => Some(p),
            None => Self::find_config_file(),
        };

        let mut config = match config_path {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => EngineConfig::default(),
        };

        config.merge_env()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&contents).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_yaml(contents: &str) -> std::result::Result<Self, serde_yaml::Error> {
        if contents.trim().is_empty() {
            return Ok(EngineConfig::default());
        }
        serde_yaml::from_str(contents)
    }

    /// Find a configuration file in the working directory or the home directory
    fn find_config_file() -> Option<PathBuf> {
        let local = ["heartflow.yaml", "heartflow.yml", ".heartflow.yaml"]
            .into_iter()
            .map(PathBuf::from)
            .find(|p| p.exists());
        if local.is_some() {
            return local;
        }

        dirs::home_dir()
            .map(|home| home.join(".heartflow").join("config.yaml"))
            .filter(|p| p.exists())
    }

    /// Merge environment variables into configuration
    fn merge_env(&mut self) -> Result<()> {
        self.merge_vars(|name| std::env::var(name).ok())
    }

    pub(crate) fn merge_vars<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup("HEARTFLOW_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("HEARTFLOW_LOG_FORMAT") {
            self.logging.format =
                format
                    .parse()
                    .map_err(|reason| ConfigError::InvalidEnv {
                        variable: "HEARTFLOW_LOG_FORMAT",
                        value: format.clone(),
                        reason,
                    })?;
        }
        if let Some(max) = lookup("HEARTFLOW_MAX_RETAINED_INSTANCES") {
            self.max_retained_instances =
                max.parse().map_err(|e: std::num::ParseIntError| ConfigError::InvalidEnv {
                    variable: "HEARTFLOW_MAX_RETAINED_INSTANCES",
                    value: max.clone(),
                    reason: e.to_string(),
                })?;
        }
        if let Some(ttl) = lookup("HEARTFLOW_INSTANCE_TTL") {
            self.instance_ttl = Some(parse_env_duration("HEARTFLOW_INSTANCE_TTL", &ttl)?);
        }
        if let Some(timeout) = lookup("HEARTFLOW_DEFAULT_TASK_TIMEOUT") {
            self.default_task_timeout =
                Some(parse_env_duration("HEARTFLOW_DEFAULT_TASK_TIMEOUT", &timeout)?);
        }

        Ok(())
    }
}

fn parse_env_duration(variable: &'static str, value: &str) -> Result<Duration> {
    humantime::parse_duration(value).map_err(|e| ConfigError::InvalidEnv {
        variable,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.max_retained_instances, 1000);
        assert!(config.enforce_timeouts);
        assert_eq!(config.poll_interval, Duration::from_millis(50));
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_partial_yaml() {
        let config = EngineConfig::from_yaml(
            r#"
max_retained_instances: 10
instance_ttl: 1h 30m
default_task_timeout: 45s
logging:
  format: compact
"#,
        )
        .unwrap();

        assert_eq!(config.max_retained_instances, 10);
        assert_eq!(config.instance_ttl, Some(Duration::from_secs(5400)));
        assert_eq!(config.default_task_timeout, Some(Duration::from_secs(45)));
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Compact);
        assert!(config.enforce_timeouts);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "enforce_timeouts: false\npoll_interval: 5ms").unwrap();

        let config = EngineConfig::from_file(file.path()).unwrap();
        assert!(!config.enforce_timeouts);
        assert_eq!(config.poll_interval, Duration::from_millis(5));
    }

    #[test]
    fn test_bad_file_reports_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "max_retained_instances: [not, a, number]").unwrap();

        let error = EngineConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(error, ConfigError::Parse { .. }));
        assert!(error.to_string().contains(&file.path().display().to_string()));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("HEARTFLOW_LOG_LEVEL", "debug"),
            ("HEARTFLOW_LOG_FORMAT", "compact"),
            ("HEARTFLOW_MAX_RETAINED_INSTANCES", "5"),
            ("HEARTFLOW_INSTANCE_TTL", "10m"),
            ("HEARTFLOW_DEFAULT_TASK_TIMEOUT", "2s"),
        ]
        .into_iter()
        .collect();

        let mut config = EngineConfig::default();
        config
            .merge_vars(|name| env.get(name).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Compact);
        assert_eq!(config.max_retained_instances, 5);
        assert_eq!(config.instance_ttl, Some(Duration::from_secs(600)));
        assert_eq!(config.default_task_timeout, Some(Duration::from_secs(2)));
    }

    #[test]
    fn test_invalid_env_value() {
        let mut config = EngineConfig::default();
        let error = config
            .merge_vars(|name| (name == "HEARTFLOW_MAX_RETAINED_INSTANCES").then(|| "lots".to_string()))
            .unwrap_err();

        assert!(matches!(
            error,
            ConfigError::InvalidEnv {
                variable: "HEARTFLOW_MAX_RETAINED_INSTANCES",
                ..
            }
        ));
    }
}
