// ABOUTME: Task handler trait and the table binding each task type to its handler
// ABOUTME: Contains handlers for remote calls, transforms, decisions, notifications, and composites

pub mod decision;
pub mod notify;
pub mod parallel;
pub mod remote_call;
pub mod sequence;
pub mod transform;

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;

use crate::engine::error::{EngineError, Result};
use crate::engine::{ExecutionContext, TaskResult};
use crate::integrations::Collaborators;
use crate::model::{Task, TaskType};

pub use decision::DecisionHandler;
pub use notify::NotifyHandler;
pub use parallel::ParallelHandler;
pub use remote_call::RemoteCallHandler;
pub use sequence::SequenceHandler;
pub use transform::TransformHandler;

#[async_trait]
pub trait TaskHandler: Send + Sync {
    /// Run one attempt of `task`. Errors are recorded as a failed result by
    /// the executor unless they are fatal.
    async fn execute(&self, task: &Task, ctx: &ExecutionContext) -> Result<Value>;
}

/// One slot per task type, so adding a task type forces every lookup to handle it.
#[derive(Clone, Default)]
pub struct HandlerTable {
    remote_call: Option<Arc<dyn TaskHandler>>,
    transform: Option<Arc<dyn TaskHandler>>,
    decision: Option<Arc<dyn TaskHandler>>,
    notify: Option<Arc<dyn TaskHandler>>,
    parallel: Option<Arc<dyn TaskHandler>>,
    sequence: Option<Arc<dyn TaskHandler>>,
}

impl HandlerTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in handler for every task type, bound to the given collaborators.
    pub fn standard(collaborators: &Collaborators) -> Self {
        Self {
            remote_call: Some(Arc::new(RemoteCallHandler::new(
                collaborators.transport.clone(),
            ))),
            transform: Some(Arc::new(TransformHandler::new(
                collaborators.transformer.clone(),
            ))),
            decision: Some(Arc::new(DecisionHandler)),
            notify: Some(Arc::new(NotifyHandler::new(collaborators.notifier.clone()))),
            parallel: Some(Arc::new(ParallelHandler)),
            sequence: Some(Arc::new(SequenceHandler)),
        }
    }

    fn slot(&mut self, task_type: TaskType) -> &mut Option<Arc<dyn TaskHandler>> {
        match task_type {
            TaskType::RemoteCall => &mut self.remote_call,
            TaskType::Transform => &mut self.transform,
            TaskType::Decision => &mut self.decision,
            TaskType::Notify => &mut self.notify,
            TaskType::Parallel => &mut self.parallel,
            TaskType::Sequence => &mut self.sequence,
        }
    }

    pub fn get(&self, task_type: TaskType) -> Option<Arc<dyn TaskHandler>> {
        let slot = match task_type {
            TaskType::RemoteCall => &self.remote_call,
            TaskType::Transform => &self.transform,
            TaskType::Decision => &self.decision,
            TaskType::Notify => &self.notify,
            TaskType::Parallel => &self.parallel,
            TaskType::Sequence => &self.sequence,
        };
        slot.clone()
    }

    pub fn set(&mut self, task_type: TaskType, handler: Arc<dyn TaskHandler>) {
        *self.slot(task_type) = Some(handler);
    }

    pub fn remove(&mut self, task_type: TaskType) {
        *self.slot(task_type) = None;
    }

    pub fn supported(&self) -> Vec<TaskType> {
        TaskType::ALL
            .into_iter()
            .filter(|t| self.get(*t).is_some())
            .collect()
    }
}

/// Parse the `tasks` list of a composite task into sub-tasks.
pub(crate) fn sub_tasks(task: &Task) -> Result<Vec<Task>> {
    let Some(raw) = task.config.get("tasks") else {
        return Ok(Vec::new());
    };
    let descriptors = raw
        .as_array()
        .ok_or_else(|| EngineError::invalid_config(&task.id, "'tasks' must be a list"))?;

    descriptors
        .iter()
        .enumerate()
        .map(|(i, descriptor)| {
            Task::from_descriptor(descriptor).map_err(|e| {
                EngineError::invalid_config(&task.id, format!("sub-task {}: {}", i, e))
            })
        })
        .collect()
}

/// Ids of every sub-task nested under a composite task, at any depth.
/// Descriptors that fail to parse contribute nothing.
pub(crate) fn descendant_ids(task: &Task) -> HashSet<String> {
    let mut ids = HashSet::new();
    let mut pending = sub_tasks(task).unwrap_or_default();
    while let Some(child) = pending.pop() {
        if child.task_type.is_composite() {
            pending.extend(sub_tasks(&child).unwrap_or_default());
        }
        ids.insert(child.id);
    }
    ids
}

pub(crate) fn results_to_value(task: &Task, results: &[TaskResult]) -> Result<Value> {
    serde_json::to_value(results).map_err(|e| {
        EngineError::Internal(format!("serializing results of {}: {}", task.id, e))
    })
}

#[cfg(test)]
pub(crate) fn test_context(variables: Value) -> ExecutionContext {
    use crate::engine::{Executor, InstanceContext, TaskScheduler, WorkflowInstance};

    let variables = variables.as_object().cloned().unwrap_or_default();
    let instance = InstanceContext::new(WorkflowInstance::new("test_1", "test", variables));
    ExecutionContext::new(
        instance,
        Executor::new(HandlerTable::standard(&Collaborators::default()), TaskScheduler::new()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_standard_table_is_complete() {
        let table = HandlerTable::standard(&Collaborators::default());
        assert_eq!(table.supported(), TaskType::ALL.to_vec());
    }

    #[test]
    fn test_remove_and_set() {
        let mut table = HandlerTable::standard(&Collaborators::default());
        table.remove(TaskType::Notify);
        assert!(table.get(TaskType::Notify).is_none());

        table.set(TaskType::Notify, Arc::new(DecisionHandler));
        assert!(table.get(TaskType::Notify).is_some());
        assert!(HandlerTable::empty().supported().is_empty());
    }

    #[test]
    fn test_sub_task_parsing() {
        let composite = Task::new("fan_out", TaskType::Parallel).with_config(json!({
            "tasks": [
                {"id": "a", "type": "decision"},
                {"id": "b", "type": "notification", "config": {"recipient": "ward"}}
            ]
        }));
        let tasks = sub_tasks(&composite).unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[1].task_type, TaskType::Notify);

        let empty = Task::new("nothing", TaskType::Sequence);
        assert!(sub_tasks(&empty).unwrap().is_empty());

        let broken = Task::new("broken", TaskType::Sequence)
            .with_config(json!({"tasks": [{"id": "x", "type": "teleport"}]}));
        assert!(matches!(
            sub_tasks(&broken),
            Err(EngineError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_descendant_ids_walk_nested_composites() {
        let composite = Task::new("outer", TaskType::Sequence).with_config(json!({
            "tasks": [
                {"id": "inner", "type": "parallel", "config": {"tasks": [
                    {"id": "x", "type": "api_call"},
                    {"id": "y", "type": "notification"}
                ]}},
                {"id": "z", "type": "decision"}
            ]
        }));

        let mut ids: Vec<String> = descendant_ids(&composite).into_iter().collect();
        ids.sort();
        assert_eq!(ids, vec!["inner", "x", "y", "z"]);
        assert!(descendant_ids(&Task::new("leaf", TaskType::Decision)).is_empty());
    }
}
