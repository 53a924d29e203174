// ABOUTME: Parallel composite task: runs every configured sub-task concurrently
// ABOUTME: Collects all results in input order; sub-task errors become failed results

use async_trait::async_trait;
use futures::future::join_all;
use serde_json::Value;
use tracing::{info, warn};

use super::{results_to_value, sub_tasks, TaskHandler};
use crate::engine::error::Result;
use crate::engine::{ExecutionContext, TaskResult};
use crate::model::Task;

pub struct ParallelHandler;

#[async_trait]
impl TaskHandler for ParallelHandler {
    async fn execute(&self, task: &Task, ctx: &ExecutionContext) -> Result<Value> {
        let children = sub_tasks(task)?;
        info!(task_id = %task.id, count = children.len(), "Running sub-tasks in parallel");

        let outcomes = join_all(
            children
                .iter()
                .map(|child| ctx.executor.execute_task(child, &ctx.instance)),
        )
        .await;

        let results: Vec<TaskResult> = children
            .iter()
            .zip(outcomes)
            .map(|(child, outcome)| match outcome {
                Ok(result) => result,
                Err(e) => {
                    warn!(task_id = %task.id, sub_task = %child.id, error = %e, "Sub-task error");
                    TaskResult::failed(&child.id, e.to_string())
                }
            })
            .collect();

        results_to_value(task, &results)
    }
}
