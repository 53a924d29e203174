// ABOUTME: Shared handles to a live instance and the context passed to task handlers
// ABOUTME: Wraps instance state in an async RwLock and carries the cancellation signal

use chrono::Utc;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock};

use super::executor::Executor;
use super::instance::WorkflowInstance;
use super::result::{TaskResult, TaskStatus};
use crate::model::Variables;

/// Cheaply clonable handle to one instance's mutable state.
#[derive(Debug, Clone)]
pub struct InstanceContext {
    id: Arc<str>,
    state: Arc<RwLock<WorkflowInstance>>,
    cancel: Arc<watch::Sender<bool>>,
}

impl InstanceContext {
    pub fn new(instance: WorkflowInstance) -> Self {
        let (cancel, _) = watch::channel(false);
        Self {
            id: Arc::from(instance.id.as_str()),
            state: Arc::new(RwLock::new(instance)),
            cancel: Arc::new(cancel),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub async fn snapshot(&self) -> WorkflowInstance {
        self.state.read().await.clone()
    }

    pub async fn status(&self) -> TaskStatus {
        self.state.read().await.status
    }

    pub async fn is_finished(&self) -> bool {
        self.state.read().await.is_finished()
    }

    pub async fn finished_at(&self) -> Option<chrono::DateTime<Utc>> {
        self.state.read().await.finished_at
    }

    pub async fn variables(&self) -> Variables {
        self.state.read().await.variables.clone()
    }

    pub async fn variable(&self, name: &str) -> Option<Value> {
        self.state.read().await.variables.get(name).cloned()
    }

    pub async fn set_variable(&self, name: impl Into<String>, value: Value) {
        let mut state = self.state.write().await;
        state.variables.insert(name.into(), value);
        state.touch();
    }

    pub async fn task_result(&self, task_id: &str) -> Option<TaskResult> {
        self.state.read().await.task_results.get(task_id).cloned()
    }

    pub async fn record_result(&self, result: TaskResult) {
        let mut state = self.state.write().await;
        state.task_results.insert(result.task_id.clone(), result);
        state.touch();
    }

    /// Fail results left `running` by an attempt that was dropped mid-flight.
    /// With a scope only those task ids are touched. Returns the failed ids.
    pub async fn fail_running(&self, scope: Option<&HashSet<String>>, message: &str) -> Vec<String> {
        let mut state = self.state.write().await;
        let mut failed = Vec::new();
        for (task_id, result) in state.task_results.iter_mut() {
            let in_scope = scope.map_or(true, |ids| ids.contains(task_id));
            if in_scope && result.status == TaskStatus::Running {
                result.mark_failed(message);
                failed.push(task_id.clone());
            }
        }
        if !failed.is_empty() {
            state.touch();
        }
        failed
    }

    /// True when every listed dependency has a `completed` result.
    pub async fn dependencies_completed(&self, dependencies: &[String]) -> bool {
        let state = self.state.read().await;
        dependencies.iter().all(|dep| {
            state
                .task_results
                .get(dep)
                .map(TaskResult::is_completed)
                .unwrap_or(false)
        })
    }

    /// Retry attempts already spent on a task, kept as the `{task_id}_retries` variable.
    pub async fn retry_count(&self, task_id: &str) -> u32 {
        self.variable(&retry_key(task_id))
            .await
            .and_then(|v| v.as_u64())
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(0)
    }

    pub async fn set_retry_count(&self, task_id: &str, count: u32) {
        self.set_variable(retry_key(task_id), Value::from(count)).await;
    }

    pub async fn mark_running(&self) {
        let mut state = self.state.write().await;
        if state.status == TaskStatus::Pending {
            state.status = TaskStatus::Running;
            state.touch();
        }
    }

    /// Flip a running instance to cancelled. Returns false in any other state.
    pub async fn cancel(&self) -> bool {
        let mut state = self.state.write().await;
        if state.status != TaskStatus::Running {
            return false;
        }
        state.status = TaskStatus::Cancelled;
        state.touch();
        self.cancel.send_replace(true);
        true
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    /// Close out the run. A fatal error wins over cancellation; otherwise a
    /// cancelled instance stays cancelled and anything else completes.
    pub async fn finish(&self, error: Option<String>) {
        let mut state = self.state.write().await;
        match error {
            Some(message) => {
                state.status = TaskStatus::Failed;
                state.error = Some(message);
            }
            None if state.status != TaskStatus::Cancelled => {
                state.status = TaskStatus::Completed;
            }
            None => {}
        }
        let now = Utc::now();
        state.finished_at = Some(now);
        state.updated_at = now;
    }

    /// Sleep for `delay` unless the instance is cancelled first.
    /// Returns true when the full delay elapsed.
    pub async fn sleep_unless_cancelled(&self, delay: Duration) -> bool {
        let mut cancelled = self.cancel.subscribe();
        if *cancelled.borrow() {
            return false;
        }
        if delay.is_zero() {
            return true;
        }

        tokio::select! {
            _ = tokio::time::sleep(delay) => true,
            _ = cancelled.wait_for(|flag| *flag) => false,
        }
    }
}

fn retry_key(task_id: &str) -> String {
    format!("{}_retries", task_id)
}

/// What a handler sees while executing: the live instance plus the executor,
/// which composite handlers use to run their sub-tasks.
#[derive(Clone)]
pub struct ExecutionContext {
    pub instance: InstanceContext,
    pub executor: Executor,
}

impl ExecutionContext {
    pub fn new(instance: InstanceContext, executor: Executor) -> Self {
        Self { instance, executor }
    }

    pub fn instance_id(&self) -> &str {
        self.instance.id()
    }
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("instance_id", &self.instance.id())
            .finish()
    }
}
