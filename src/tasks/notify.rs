// ABOUTME: Notification task: dispatches a channel/recipient/template triple to the notifier
// ABOUTME: Returns the notifier's acknowledgement as the task output

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use super::TaskHandler;
use crate::engine::error::{EngineError, Result};
use crate::engine::ExecutionContext;
use crate::integrations::{Notification, Notifier};
use crate::model::Task;
use crate::template::VariableResolver;

pub struct NotifyHandler {
    notifier: Arc<dyn Notifier>,
}

impl NotifyHandler {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }
}

#[async_trait]
impl TaskHandler for NotifyHandler {
    async fn execute(&self, task: &Task, ctx: &ExecutionContext) -> Result<Value> {
        let notification = {
            let variables = ctx.instance.variables().await;
            let resolver = VariableResolver::new(&variables);
            let field = |key: &str, default: &str| {
                resolver.resolve_str(task.config_str(key).unwrap_or(default))
            };
            Notification {
                channel: field("type", "email"),
                recipient: field("recipient", ""),
                template: field("template", ""),
            }
        };

        let ack = self
            .notifier
            .notify(notification)
            .await
            .map_err(|e| EngineError::collaborator(&task.id, "notifier", e))?;

        serde_json::to_value(ack).map_err(|e| EngineError::Internal(e.to_string()))
    }
}
