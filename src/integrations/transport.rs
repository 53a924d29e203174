// ABOUTME: HTTP transport interface used by remote-call tasks
// ABOUTME: The engine ships no network client; embedders plug one in

use anyhow::bail;
use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A fully resolved outbound call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteRequest {
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub headers: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl RemoteRequest {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into().to_ascii_uppercase(),
            url: url.into(),
            headers: IndexMap::new(),
            body: None,
        }
    }

    /// Methods that carry a request body.
    pub fn method_has_body(method: &str) -> bool {
        matches!(method, "POST" | "PUT" | "PATCH")
    }
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Issue the call and return the parsed response body.
    async fn call(&self, request: RemoteRequest) -> anyhow::Result<Value>;
}

/// Default transport: every call fails until a real one is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredTransport;

#[async_trait]
impl HttpTransport for UnconfiguredTransport {
    async fn call(&self, request: RemoteRequest) -> anyhow::Result<Value> {
        bail!(
            "no HTTP transport configured (attempted {} {})",
            request.method,
            request.url
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unconfigured_transport_fails() {
        let error = UnconfiguredTransport
            .call(RemoteRequest::new("get", "https://ehr.local/patients"))
            .await
            .unwrap_err();

        assert!(error.to_string().contains("GET https://ehr.local/patients"));
    }

    #[test]
    fn test_body_methods() {
        assert!(RemoteRequest::method_has_body("POST"));
        assert!(RemoteRequest::method_has_body("PATCH"));
        assert!(!RemoteRequest::method_has_body("GET"));
        assert!(!RemoteRequest::method_has_body("DELETE"));
    }
}
