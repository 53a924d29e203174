// ABOUTME: Task definitions, task type tags, and retry policies
// ABOUTME: Tasks are the units of work a process definition is built from

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

use super::duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub task_type: TaskType,
    /// Handler-specific configuration; opaque to the executor.
    #[serde(default)]
    pub config: Map<String, Value>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_retry_policy",
        skip_serializing_if = "Option::is_none"
    )]
    pub retry_policy: Option<RetryPolicy>,
    #[serde(
        default,
        with = "duration::option_seconds",
        skip_serializing_if = "Option::is_none"
    )]
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskType {
    #[serde(rename = "api_call", alias = "remote_call")]
    RemoteCall,
    #[serde(rename = "transformation", alias = "transform")]
    Transform,
    #[serde(rename = "decision")]
    Decision,
    #[serde(rename = "notification", alias = "notify")]
    Notify,
    #[serde(rename = "parallel")]
    Parallel,
    #[serde(rename = "sequence")]
    Sequence,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(with = "duration::seconds", default = "default_delay")]
    pub delay: Duration,
}

fn default_max_retries() -> u32 {
    3
}

fn default_delay() -> Duration {
    Duration::from_secs(5)
}

// An empty policy map means "no retries".
fn deserialize_retry_policy<'de, D>(deserializer: D) -> Result<Option<RetryPolicy>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) if map.is_empty() => Ok(None),
        Some(raw) => RetryPolicy::deserialize(raw)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

impl Task {
    pub fn new(id: impl Into<String>, task_type: TaskType) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            task_type,
            config: Map::new(),
            dependencies: Vec::new(),
            retry_policy: None,
            timeout: None,
        }
    }

    /// Build a task from a descriptor value, as found in composite `tasks` lists.
    pub fn from_descriptor(descriptor: &Value) -> Result<Self, serde_json::Error> {
        let mut task: Task = serde_json::from_value(descriptor.clone())?;
        task.fill_defaults();
        Ok(task)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_config(mut self, config: Value) -> Self {
        if let Value::Object(map) = config {
            self.config = map;
        }
        self
    }

    pub fn with_config_value(mut self, key: impl Into<String>, value: Value) -> Self {
        self.config.insert(key.into(), value);
        self
    }

    pub fn depends_on<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies
            .extend(dependencies.into_iter().map(Into::into));
        self
    }

    pub fn with_retry(mut self, max_retries: u32, delay: Duration) -> Self {
        self.retry_policy = Some(RetryPolicy { max_retries, delay });
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn config_str(&self, key: &str) -> Option<&str> {
        self.config.get(key).and_then(Value::as_str)
    }

    pub(crate) fn fill_defaults(&mut self) {
        if self.name.is_empty() {
            self.name = self.id.clone();
        }
    }
}

impl TaskType {
    pub const ALL: [TaskType; 6] = [
        TaskType::RemoteCall,
        TaskType::Transform,
        TaskType::Decision,
        TaskType::Notify,
        TaskType::Parallel,
        TaskType::Sequence,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::RemoteCall => "api_call",
            TaskType::Transform => "transformation",
            TaskType::Decision => "decision",
            TaskType::Notify => "notification",
            TaskType::Parallel => "parallel",
            TaskType::Sequence => "sequence",
        }
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, TaskType::Parallel | TaskType::Sequence)
    }
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
