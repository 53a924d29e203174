// ABOUTME: Workflow instance state: variables, task results, and overall status
// ABOUTME: Snapshots of this struct are what status queries return

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::result::{TaskResult, TaskStatus};
use crate::model::Variables;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowInstance {
    pub id: String,
    pub process_id: String,
    pub status: TaskStatus,
    pub variables: Variables,
    pub task_results: IndexMap<String, TaskResult>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set once the run loop exits, whatever the final status.
    pub finished_at: Option<DateTime<Utc>>,
    /// The fatal error that aborted the run, if any.
    pub error: Option<String>,
}

impl WorkflowInstance {
    pub fn new(id: impl Into<String>, process_id: impl Into<String>, variables: Variables) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            process_id: process_id.into(),
            status: TaskStatus::Pending,
            variables,
            task_results: IndexMap::new(),
            created_at: now,
            updated_at: now,
            finished_at: None,
            error: None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }

    pub fn task_result(&self, task_id: &str) -> Option<&TaskResult> {
        self.task_results.get(task_id)
    }

    pub fn count_with_status(&self, status: TaskStatus) -> usize {
        self.task_results
            .values()
            .filter(|r| r.status == status)
            .count()
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl std::fmt::Display for WorkflowInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}): {} [{} completed, {} failed, {} skipped]",
            self.id,
            self.process_id,
            self.status,
            self.count_with_status(TaskStatus::Completed),
            self.count_with_status(TaskStatus::Failed),
            self.count_with_status(TaskStatus::Skipped),
        )
    }
}
