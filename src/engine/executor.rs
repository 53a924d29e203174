// ABOUTME: Instance state machine that walks tasks in dependency order
// ABOUTME: Applies dependency gating, dispatches to handlers, and drives the retry loop

use futures::future::BoxFuture;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use super::context::{ExecutionContext, InstanceContext};
use super::dependency::execution_order;
use super::error::{EngineError, Result};
use super::result::TaskResult;
use super::scheduler::{RetryDecision, TaskScheduler};
use crate::model::{ProcessDefinition, Task};
use crate::tasks::{descendant_ids, HandlerTable};

#[derive(Clone)]
pub struct Executor {
    handlers: Arc<HandlerTable>,
    scheduler: TaskScheduler,
}

impl Executor {
    pub fn new(handlers: HandlerTable, scheduler: TaskScheduler) -> Self {
        Self {
            handlers: Arc::new(handlers),
            scheduler,
        }
    }

    pub fn handlers(&self) -> &HandlerTable {
        &self.handlers
    }

    pub fn scheduler(&self) -> &TaskScheduler {
        &self.scheduler
    }

    /// Run an instance to the end. Never returns an error: fatal errors and
    /// panics are recorded on the instance as a `failed` status.
    #[instrument(
        skip(self, process, instance),
        fields(instance_id = %instance.id(), process_id = %process.id)
    )]
    pub async fn run_instance(&self, process: Arc<ProcessDefinition>, instance: InstanceContext) {
        instance.mark_running().await;
        info!("Starting instance run with {} tasks", process.tasks.len());

        let outcome = AssertUnwindSafe(self.run_tasks(&process, &instance))
            .catch_unwind()
            .await;

        let error = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(e)) => {
                error!(error = %e, "Instance run aborted");
                Some(e.to_string())
            }
            Err(panic) => {
                let message = format!("Task handler panicked: {}", panic_message(panic.as_ref()));
                let abandoned = instance.fail_running(None, &message).await;
                error!(panic = %message, tasks = ?abandoned, "Task handler panicked");
                Some(message)
            }
        };

        instance.finish(error).await;
        let status = instance.status().await;
        info!(status = %status, "Instance run finished");
    }

    async fn run_tasks(&self, process: &ProcessDefinition, instance: &InstanceContext) -> Result<()> {
        let order = execution_order(&process.tasks)?;
        debug!(
            "Execution order: {:?}",
            order.iter().map(|t| t.id.as_str()).collect::<Vec<_>>()
        );

        for task in order {
            if instance.is_cancelled() {
                info!(task_id = %task.id, "Instance cancelled, not starting further tasks");
                break;
            }
            self.execute_task(task, instance).await?;
        }

        Ok(())
    }

    /// Execute one task through gating, dispatch, and retries, recording its
    /// result on the instance. Only fatal errors are returned as `Err`.
    pub fn execute_task<'a>(
        &'a self,
        task: &'a Task,
        instance: &'a InstanceContext,
    ) -> BoxFuture<'a, Result<TaskResult>> {
        async move {
            let mut attempt = 1;
            loop {
                if !instance.dependencies_completed(&task.dependencies).await {
                    info!(task_id = %task.id, "Dependencies not completed, skipping task");
                    let result = TaskResult::skipped(&task.id);
                    instance.record_result(result.clone()).await;
                    return Ok(result);
                }

                let mut result = TaskResult::new(&task.id);
                result.mark_started();
                instance.record_result(result.clone()).await;

                info!(
                    task_id = %task.id,
                    task_type = %task.task_type,
                    attempt,
                    "Executing task"
                );

                match self.attempt(task, instance).await {
                    Ok(output) => {
                        result.mark_completed(output);
                        instance.record_result(result.clone()).await;
                        info!(task_id = %task.id, attempt, "Task completed");
                        return Ok(result);
                    }
                    Err(e) if e.is_fatal() => {
                        result.mark_failed(e.to_string());
                        instance.record_result(result).await;
                        return Err(e);
                    }
                    Err(e) => {
                        warn!(task_id = %task.id, attempt, error = %e, "Task failed");
                        if matches!(e, EngineError::TaskTimeout { .. }) && task.task_type.is_composite() {
                            let scope = descendant_ids(task);
                            let abandoned = instance.fail_running(Some(&scope), &e.to_string()).await;
                            if !abandoned.is_empty() {
                                warn!(task_id = %task.id, sub_tasks = ?abandoned, "Sub-tasks abandoned by timeout");
                            }
                        }
                        result.mark_failed(e.to_string());
                        instance.record_result(result.clone()).await;
                    }
                }

                match self.scheduler.next_attempt(task, instance).await {
                    RetryDecision::Retry { attempt: next } => attempt = next,
                    RetryDecision::GiveUp | RetryDecision::Cancelled => {
                        error!(task_id = %task.id, attempts = attempt, "Task failed permanently");
                        return Ok(result);
                    }
                }
            }
        }
        .boxed()
    }

    async fn attempt(&self, task: &Task, instance: &InstanceContext) -> Result<serde_json::Value> {
        let handler = self
            .handlers
            .get(task.task_type)
            .ok_or(EngineError::HandlerNotFound {
                task_type: task.task_type,
            })?;

        let ctx = ExecutionContext::new(instance.clone(), self.clone());
        self.scheduler
            .run_attempt(task, handler.execute(task, &ctx))
            .await
    }
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("scheduler", &self.scheduler)
            .finish()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
