// ABOUTME: Error types for process definition construction and loading
// ABOUTME: Separates structural validation failures from decoding and IO failures

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Failed to read process definition: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Unsupported definition format: {0}")]
    UnsupportedFormat(String),

    #[error("Validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Duplicate task id '{task_id}' in process '{process_id}'")]
    DuplicateTask { process_id: String, task_id: String },
}

pub type Result<T> = std::result::Result<T, ModelError>;
