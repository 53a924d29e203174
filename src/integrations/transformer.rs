// ABOUTME: Data transformation interface for delegated transform variants
// ABOUTME: Used for interchange-format mapping; the default returns its input unchanged

use async_trait::async_trait;
use serde_json::Value;

#[async_trait]
pub trait Transformer: Send + Sync {
    /// Transform `input` as described by the task's `transform` descriptor.
    async fn transform(&self, input: Value, descriptor: &Value) -> anyhow::Result<Value>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughTransformer;

#[async_trait]
impl Transformer for PassthroughTransformer {
    async fn transform(&self, input: Value, _descriptor: &Value) -> anyhow::Result<Value> {
        Ok(input)
    }
}
