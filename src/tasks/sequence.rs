// ABOUTME: Sequence composite task: runs configured sub-tasks one after another
// ABOUTME: Stops at the first failed sub-task and returns the results so far

use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, warn};

use super::{results_to_value, sub_tasks, TaskHandler};
use crate::engine::error::Result;
use crate::engine::{ExecutionContext, TaskStatus};
use crate::model::Task;

pub struct SequenceHandler;

#[async_trait]
impl TaskHandler for SequenceHandler {
    async fn execute(&self, task: &Task, ctx: &ExecutionContext) -> Result<Value> {
        let children = sub_tasks(task)?;
        info!(task_id = %task.id, count = children.len(), "Running sub-tasks in sequence");

        let mut results = Vec::with_capacity(children.len());
        for child in &children {
            let result = ctx.executor.execute_task(child, &ctx.instance).await?;
            let failed = result.status == TaskStatus::Failed;
            results.push(result);
            if failed {
                warn!(task_id = %task.id, sub_task = %child.id, "Sequence stopped at failed sub-task");
                break;
            }
        }

        results_to_value(task, &results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::TaskResult;
    use crate::model::TaskType;
    use crate::tasks::test_context;
    use serde_json::json;

    #[tokio::test]
    async fn test_stops_at_first_failure() {
        let ctx = test_context(json!({}));
        let task = Task::new("steps", TaskType::Sequence).with_config(json!({
            "tasks": [
                {"id": "a", "type": "notification"},
                {"id": "b", "type": "api_call", "config": {"url": "https://ehr.local"}},
                {"id": "c", "type": "notification"}
            ]
        }));

        let output = SequenceHandler.execute(&task, &ctx).await.unwrap();
        let results: Vec<TaskResult> = serde_json::from_value(output).unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].status, TaskStatus::Completed);
        assert_eq!(results[1].status, TaskStatus::Failed);
        assert!(ctx.instance.task_result("c").await.is_none());
    }

    #[tokio::test]
    async fn test_skipped_sub_task_does_not_stop() {
        let ctx = test_context(json!({}));
        let task = Task::new("steps", TaskType::Sequence).with_config(json!({
            "tasks": [
                {"id": "a", "type": "decision", "dependencies": ["never_ran"]},
                {"id": "b", "type": "decision"}
            ]
        }));

        let output = SequenceHandler.execute(&task, &ctx).await.unwrap();
        let results: Vec<TaskResult> = serde_json::from_value(output).unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].status, TaskStatus::Skipped);
        assert_eq!(results[1].status, TaskStatus::Completed);
    }

    #[tokio::test]
    async fn test_sub_tasks_see_earlier_variables() {
        let ctx = test_context(json!({}));
        let task = Task::new("steps", TaskType::Sequence).with_config(json!({
            "tasks": [
                {"id": "set", "type": "decision", "config": {"rules": [
                    {"actions": [{"type": "set_variable", "variable": "route", "value": "icu"}]}
                ]}},
                {"id": "check", "type": "decision", "config": {"rules": [
                    {"condition": {"left": "$route", "right": "icu"},
                     "actions": [{"type": "set_variable", "variable": "checked", "value": true}]}
                ]}}
            ]
        }));

        SequenceHandler.execute(&task, &ctx).await.unwrap();
        assert_eq!(ctx.instance.variable("checked").await, Some(json!(true)));
    }
}
