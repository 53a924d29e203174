// ABOUTME: Common utilities and helpers for integration tests
// ABOUTME: Provides a process builder, collaborator doubles, and polling helpers

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use heartflow::engine::{EngineError, ExecutionContext};
use heartflow::integrations::{HttpTransport, RemoteRequest};
use heartflow::{ProcessDefinition, Task, TaskHandler, TaskType, Variables, WorkflowEngine, WorkflowInstance};

pub const WAIT: Duration = Duration::from_secs(10);

pub struct ProcessBuilder {
    id: String,
    name: String,
    variables: Variables,
    tasks: Vec<Task>,
}

impl ProcessBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            name: format!("Test process: {}", id),
            variables: Variables::new(),
            tasks: Vec::new(),
        }
    }

    pub fn with_variable(mut self, key: &str, value: Value) -> Self {
        self.variables.insert(key.to_string(), value);
        self
    }

    pub fn with_task(mut self, task: Task) -> Self {
        self.tasks.push(task);
        self
    }

    /// A remote call to `https://ehr.test/{id}`.
    pub fn add_call(self, id: &str, depends_on: &[&str]) -> Self {
        let task = Task::new(id, TaskType::RemoteCall)
            .with_config(json!({"url": format!("https://ehr.test/{}", id)}))
            .depends_on(depends_on.iter().copied());
        self.with_task(task)
    }

    pub fn add_decision(self, id: &str, depends_on: &[&str]) -> Self {
        let task = Task::new(id, TaskType::Decision).depends_on(depends_on.iter().copied());
        self.with_task(task)
    }

    pub fn build(self) -> ProcessDefinition {
        ProcessDefinition::new(self.id, self.name, self.tasks)
            .expect("test process must be valid")
            .with_variables(self.variables)
    }
}

pub fn vars(value: Value) -> Variables {
    value.as_object().cloned().expect("variables must be an object")
}

/// Records every request and answers with `{"ok": true, "url": ...}`.
#[derive(Default)]
pub struct RecordingTransport {
    pub requests: Mutex<Vec<RemoteRequest>>,
}

impl RecordingTransport {
    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn urls(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.url.clone())
            .collect()
    }
}

#[async_trait]
impl HttpTransport for RecordingTransport {
    async fn call(&self, request: RemoteRequest) -> anyhow::Result<Value> {
        let url = request.url.clone();
        self.requests.lock().unwrap().push(request);
        Ok(json!({"ok": true, "url": url}))
    }
}

/// Fails every call, counting attempts.
#[derive(Default)]
pub struct FailingTransport {
    pub calls: AtomicUsize,
}

impl FailingTransport {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HttpTransport for FailingTransport {
    async fn call(&self, request: RemoteRequest) -> anyhow::Result<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        anyhow::bail!("503 Service Unavailable from {}", request.url)
    }
}

/// Fails only for URLs containing `needle`; records everything else.
pub struct SelectiveTransport {
    pub needle: String,
    pub inner: RecordingTransport,
}

impl SelectiveTransport {
    pub fn failing_on(needle: &str) -> Self {
        Self {
            needle: needle.to_string(),
            inner: RecordingTransport::default(),
        }
    }
}

#[async_trait]
impl HttpTransport for SelectiveTransport {
    async fn call(&self, request: RemoteRequest) -> anyhow::Result<Value> {
        if request.url.contains(&self.needle) {
            anyhow::bail!("connection reset by {}", request.url);
        }
        self.inner.call(request).await
    }
}

/// Sleeps before answering; counts started and finished calls.
pub struct SlowTransport {
    pub delay: Duration,
    pub started: AtomicUsize,
    pub finished: AtomicUsize,
}

impl SlowTransport {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            started: AtomicUsize::new(0),
            finished: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl HttpTransport for SlowTransport {
    async fn call(&self, _request: RemoteRequest) -> anyhow::Result<Value> {
        self.started.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.finished.fetch_add(1, Ordering::SeqCst);
        Ok(json!({"ok": true}))
    }
}

/// Handler that only counts invocations.
#[derive(Default)]
pub struct CountingHandler {
    pub calls: AtomicUsize,
}

impl CountingHandler {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TaskHandler for CountingHandler {
    async fn execute(&self, task: &Task, _ctx: &ExecutionContext) -> Result<Value, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(json!({"handled": task.id}))
    }
}

pub async fn run_to_end(
    engine: &WorkflowEngine,
    process: ProcessDefinition,
    variables: Variables,
) -> WorkflowInstance {
    let process_id = process.id.clone();
    engine.register(process).await.unwrap();
    let instance_id = engine.start(&process_id, variables).await.unwrap();
    engine.wait_for(&instance_id, WAIT).await.unwrap()
}

/// Poll until `predicate` holds for the instance snapshot.
pub async fn wait_until<F>(engine: &WorkflowEngine, instance_id: &str, predicate: F) -> WorkflowInstance
where
    F: Fn(&WorkflowInstance) -> bool,
{
    let poll = async {
        loop {
            if let Some(snapshot) = engine.status(instance_id).await {
                if predicate(&snapshot) {
                    return snapshot;
                }
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    };
    tokio::time::timeout(WAIT, poll)
        .await
        .expect("condition not reached in time")
}

pub fn shared<T>(value: T) -> Arc<T> {
    Arc::new(value)
}
