// ABOUTME: Transform task: reads an input by dotted path and applies the configured transform
// ABOUTME: "fhir_mapping" is delegated to the transformer; other types return the input as-is

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use super::TaskHandler;
use crate::engine::error::{EngineError, Result};
use crate::engine::ExecutionContext;
use crate::integrations::Transformer;
use crate::model::Task;
use crate::template::lookup;

pub const FHIR_MAPPING: &str = "fhir_mapping";

pub struct TransformHandler {
    transformer: Arc<dyn Transformer>,
}

impl TransformHandler {
    pub fn new(transformer: Arc<dyn Transformer>) -> Self {
        Self { transformer }
    }
}

#[async_trait]
impl TaskHandler for TransformHandler {
    async fn execute(&self, task: &Task, ctx: &ExecutionContext) -> Result<Value> {
        let input_path = task.config_str("input").unwrap_or_default();
        let input = {
            let variables = ctx.instance.variables().await;
            lookup(&variables, input_path).cloned().unwrap_or(Value::Null)
        };

        let descriptor = task.config.get("transform").cloned().unwrap_or(Value::Null);
        let transform_type = descriptor.get("type").and_then(Value::as_str);
        debug!(task_id = %task.id, input = %input_path, transform = ?transform_type, "Transforming");

        match transform_type {
            Some(FHIR_MAPPING) => self
                .transformer
                .transform(input, &descriptor)
                .await
                .map_err(|e| EngineError::collaborator(&task.id, "transformer", e)),
            _ => Ok(input),
        }
    }
}
