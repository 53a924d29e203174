// ABOUTME: Plugin trait and the metadata every plugin describes itself with
// ABOUTME: Plugins own their configuration and expose an async init/cleanup lifecycle

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginType {
    Adapter,
    Workflow,
    Transformer,
    Validator,
    Authenticator,
    Notifier,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginMetadata {
    pub name: String,
    pub version: String,
    pub plugin_type: PluginType,
    pub description: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub config_schema: Map<String, Value>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Lower numbers sort first.
    #[serde(default = "default_priority")]
    pub priority: i32,
}

fn default_enabled() -> bool {
    true
}

fn default_priority() -> i32 {
    100
}

impl PluginMetadata {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        plugin_type: PluginType,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            plugin_type,
            description: description.into(),
            author: String::new(),
            dependencies: Vec::new(),
            config_schema: Map::new(),
            enabled: default_enabled(),
            priority: default_priority(),
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

#[async_trait]
pub trait Plugin: Send + Sync {
    fn metadata(&self) -> PluginMetadata;

    async fn initialize(&self) -> anyhow::Result<()>;

    async fn cleanup(&self) -> anyhow::Result<()>;

    fn validate_config(&self, _config: &Value) -> bool {
        true
    }
}
