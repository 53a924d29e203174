// ABOUTME: Error types for process registration, instance runs, and task handlers
// ABOUTME: Separates fatal run errors from task failures that are recorded as results

use std::time::Duration;
use thiserror::Error;

use crate::model::{ModelError, TaskType};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Process not found: {process_id}")]
    ProcessNotFound { process_id: String },

    #[error("Process already registered: {process_id}")]
    DuplicateProcess { process_id: String },

    #[error("No handler registered for task type: {task_type}")]
    HandlerNotFound { task_type: TaskType },

    #[error("Task execution failed: {task_id} - {message}")]
    TaskExecution { task_id: String, message: String },

    #[error("Task timeout: {task_id} - exceeded {timeout:?}")]
    TaskTimeout { task_id: String, timeout: Duration },

    #[error("Circular dependency detected: {tasks:?}")]
    CyclicDependency { tasks: Vec<String> },

    #[error("Invalid task configuration: {task_id} - {reason}")]
    InvalidConfiguration { task_id: String, reason: String },

    #[error("{collaborator} failed for task {task_id}: {message}")]
    Collaborator {
        task_id: String,
        collaborator: &'static str,
        message: String,
    },

    #[error("Instance not found: {instance_id}")]
    InstanceNotFound { instance_id: String },

    #[error("Timed out after {timeout:?} waiting for instance {instance_id}")]
    WaitTimeout {
        instance_id: String,
        timeout: Duration,
    },

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl EngineError {
    /// Fatal errors abort the whole instance run instead of failing one task.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            EngineError::HandlerNotFound { .. } | EngineError::CyclicDependency { .. }
        )
    }

    pub fn invalid_config(task_id: &str, reason: impl Into<String>) -> Self {
        EngineError::InvalidConfiguration {
            task_id: task_id.to_string(),
            reason: reason.into(),
        }
    }

    /// Wrap a collaborator failure, keeping the full context chain in the message.
    pub fn collaborator(task_id: &str, collaborator: &'static str, error: anyhow::Error) -> Self {
        EngineError::Collaborator {
            task_id: task_id.to_string(),
            collaborator,
            message: format!("{:#}", error),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(EngineError::HandlerNotFound {
            task_type: TaskType::Decision
        }
        .is_fatal());
        assert!(EngineError::CyclicDependency {
            tasks: vec!["a".into(), "b".into()]
        }
        .is_fatal());
        assert!(!EngineError::invalid_config("a", "missing url").is_fatal());
        assert!(!EngineError::TaskTimeout {
            task_id: "a".into(),
            timeout: Duration::from_millis(10)
        }
        .is_fatal());
    }

    #[test]
    fn test_collaborator_message_keeps_context() {
        let error = anyhow::anyhow!("connection refused").context("POST https://ehr.local/admit");
        let wrapped = EngineError::collaborator("admit", "transport", error);

        assert_eq!(
            wrapped.to_string(),
            "transport failed for task admit: POST https://ehr.local/admit: connection refused"
        );
    }
}
