// ABOUTME: Process definition structure, validation, and file loading
// ABOUTME: A process definition is an immutable, versioned graph of tasks

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::path::Path;

use super::error::{ModelError, Result, ValidationError};
use super::task::Task;
use super::Variables;

fn default_version() -> String {
    "1.0.0".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessDefinition {
    pub id: String,
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub variables: Variables,
    /// Declarative trigger descriptors; stored, never executed by the engine.
    #[serde(default)]
    pub triggers: Vec<Value>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl ProcessDefinition {
    /// Create a definition, rejecting duplicate task ids.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        tasks: Vec<Task>,
    ) -> std::result::Result<Self, ValidationError> {
        let mut definition = Self {
            id: id.into(),
            name: name.into(),
            version: default_version(),
            description: None,
            tasks,
            variables: Variables::new(),
            triggers: Vec::new(),
            metadata: Map::new(),
        };
        for task in &mut definition.tasks {
            task.fill_defaults();
        }
        definition.validate()?;
        Ok(definition)
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_variables(mut self, variables: Variables) -> Self {
        self.variables = variables;
        self
    }

    pub fn with_variable(mut self, key: impl Into<String>, value: Value) -> Self {
        self.variables.insert(key.into(), value);
        self
    }

    pub fn with_trigger(mut self, trigger: Value) -> Self {
        self.triggers.push(trigger);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Structural validation: task ids must be unique. Dependency references
    /// are not checked here.
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        let mut seen = HashSet::new();
        for task in &self.tasks {
            if !seen.insert(task.id.as_str()) {
                return Err(ValidationError::DuplicateTask {
                    process_id: self.id.clone(),
                    task_id: task.id.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn task(&self, task_id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    pub fn task_ids(&self) -> Vec<String> {
        self.tasks.iter().map(|t| t.id.clone()).collect()
    }

    /// Parse a definition from YAML
    pub fn from_yaml(content: &str) -> Result<Self> {
        let definition: ProcessDefinition = serde_yaml::from_str(content)?;
        definition.finish()
    }

    /// Parse a definition from JSON
    pub fn from_json(content: &str) -> Result<Self> {
        let definition: ProcessDefinition = serde_json::from_str(content)?;
        definition.finish()
    }

    /// Load a definition file; the extension selects YAML or JSON.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml(&content),
            Some("json") => Self::from_json(&content),
            other => Err(ModelError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    fn finish(mut self) -> Result<Self> {
        for task in &mut self.tasks {
            task.fill_defaults();
        }
        self.validate()?;
        Ok(self)
    }
}
