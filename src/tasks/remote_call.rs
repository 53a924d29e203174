// ABOUTME: Remote call task: resolves an HTTP request from config and sends it via the transport
// ABOUTME: Config keys: method (default GET), url, headers, body (POST/PUT/PATCH only)

use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use super::TaskHandler;
use crate::engine::error::{EngineError, Result};
use crate::engine::ExecutionContext;
use crate::integrations::{HttpTransport, RemoteRequest};
use crate::model::Task;
use crate::template::{display_value, VariableResolver};

pub struct RemoteCallHandler {
    transport: Arc<dyn HttpTransport>,
}

impl RemoteCallHandler {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    /// Build the outbound request with every `${name}` in the config resolved.
    pub fn build_request(task: &Task, resolver: &VariableResolver<'_>) -> Result<RemoteRequest> {
        let config = resolver.resolve(&Value::Object(task.config.clone()));

        let method = match config.get("method") {
            None | Some(Value::Null) => "GET",
            Some(Value::String(m)) => m.as_str(),
            Some(_) => return Err(EngineError::invalid_config(&task.id, "'method' must be a string")),
        };

        let url = config
            .get("url")
            .and_then(Value::as_str)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| EngineError::invalid_config(&task.id, "missing 'url'"))?;

        let mut request = RemoteRequest::new(method, url);

        match config.get("headers") {
            None | Some(Value::Null) => {}
            Some(Value::Object(headers)) => {
                request.headers = headers
                    .iter()
                    .map(|(name, value)| (name.clone(), display_value(value)))
                    .collect::<IndexMap<_, _>>();
            }
            Some(_) => {
                return Err(EngineError::invalid_config(&task.id, "'headers' must be a map"))
            }
        }

        if RemoteRequest::method_has_body(&request.method) {
            request.body = config.get("body").cloned();
        }

        Ok(request)
    }
}

#[async_trait]
impl TaskHandler for RemoteCallHandler {
    async fn execute(&self, task: &Task, ctx: &ExecutionContext) -> Result<Value> {
        let variables = ctx.instance.variables().await;
        let request = Self::build_request(task, &VariableResolver::new(&variables))?;

        debug!(
            task_id = %task.id,
            method = %request.method,
            url = %request.url,
            "Sending remote call"
        );

        self.transport
            .call(request)
            .await
            .map_err(|e| EngineError::collaborator(&task.id, "transport", e))
    }
}
