// ABOUTME: WorkflowEngine: registers process definitions and runs instances of them
// ABOUTME: Owns the definition registry and the instance store shared by all runs

use chrono::Utc;
use indexmap::IndexMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::info;

use super::context::InstanceContext;
use super::error::{EngineError, Result};
use super::executor::Executor;
use super::instance::WorkflowInstance;
use super::scheduler::TaskScheduler;
use super::store::InstanceStore;
use crate::config::EngineConfig;
use crate::integrations::{Collaborators, HttpTransport, Notifier, Transformer};
use crate::model::{ProcessDefinition, TaskType, Variables};
use crate::tasks::{HandlerTable, TaskHandler};

pub struct WorkflowEngine {
    processes: RwLock<IndexMap<String, Arc<ProcessDefinition>>>,
    instances: RwLock<InstanceStore>,
    executor: Executor,
    config: EngineConfig,
}

impl WorkflowEngine {
    /// Engine with default configuration and default collaborators.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> WorkflowEngineBuilder {
        WorkflowEngineBuilder::default()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Store a definition. Fails if its id is already registered.
    pub async fn register(&self, process: ProcessDefinition) -> Result<()> {
        process
            .validate()
            .map_err(|e| EngineError::Model(e.into()))?;

        let mut processes = self.processes.write().await;
        if processes.contains_key(&process.id) {
            return Err(EngineError::DuplicateProcess {
                process_id: process.id,
            });
        }

        info!(
            process_id = %process.id,
            version = %process.version,
            tasks = process.tasks.len(),
            "Registered process"
        );
        processes.insert(process.id.clone(), Arc::new(process));
        Ok(())
    }

    /// Create an instance and start running it in the background. Caller
    /// variables override the definition's defaults.
    pub async fn start(&self, process_id: &str, variables: Variables) -> Result<String> {
        let process = self
            .process(process_id)
            .await
            .ok_or_else(|| EngineError::ProcessNotFound {
                process_id: process_id.to_string(),
            })?;

        let mut merged = process.variables.clone();
        merged.extend(variables);

        let instance_id = new_instance_id(process_id);
        let instance =
            InstanceContext::new(WorkflowInstance::new(&instance_id, process_id, merged));

        {
            let mut store = self.instances.write().await;
            store.evict().await;
            store.insert(instance.clone());
        }

        info!(instance_id = %instance_id, process_id = %process_id, "Starting instance");
        let executor = self.executor.clone();
        tokio::spawn(async move { executor.run_instance(process, instance).await });

        Ok(instance_id)
    }

    /// Snapshot of an instance, if it is still retained.
    pub async fn status(&self, instance_id: &str) -> Option<WorkflowInstance> {
        let handle = self.instances.read().await.get(instance_id)?;
        Some(handle.snapshot().await)
    }

    /// Request cooperative cancellation. True only if the instance was running.
    pub async fn cancel(&self, instance_id: &str) -> bool {
        let Some(handle) = self.instances.read().await.get(instance_id) else {
            return false;
        };
        let cancelled = handle.cancel().await;
        if cancelled {
            info!(instance_id = %instance_id, "Cancellation requested");
        }
        cancelled
    }

    /// Poll until the instance run has finished, returning the final snapshot.
    pub async fn wait_for(&self, instance_id: &str, timeout: Duration) -> Result<WorkflowInstance> {
        let handle = self
            .instances
            .read()
            .await
            .get(instance_id)
            .ok_or_else(|| EngineError::InstanceNotFound {
                instance_id: instance_id.to_string(),
            })?;

        let poll_interval = self.config.poll_interval;
        let wait = async {
            loop {
                let snapshot = handle.snapshot().await;
                if snapshot.is_finished() {
                    return snapshot;
                }
                tokio::time::sleep(poll_interval).await;
            }
        };

        tokio::time::timeout(timeout, wait)
            .await
            .map_err(|_| EngineError::WaitTimeout {
                instance_id: instance_id.to_string(),
                timeout,
            })
    }

    pub async fn process(&self, process_id: &str) -> Option<Arc<ProcessDefinition>> {
        self.processes.read().await.get(process_id).cloned()
    }

    pub async fn processes(&self) -> Vec<Arc<ProcessDefinition>> {
        self.processes.read().await.values().cloned().collect()
    }

    /// Snapshots of every retained instance, oldest first.
    pub async fn instances(&self) -> Vec<WorkflowInstance> {
        let handles = self.instances.read().await.handles();
        let mut snapshots = Vec::with_capacity(handles.len());
        for handle in handles {
            snapshots.push(handle.snapshot().await);
        }
        snapshots
    }
}

impl Default for WorkflowEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for WorkflowEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowEngine")
            .field("config", &self.config)
            .finish()
    }
}

/// `{process_id}_{timestamp}_{suffix}`; the suffix keeps ids unique when two
/// instances start within the same microsecond.
fn new_instance_id(process_id: &str) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "{}_{}_{}",
        process_id,
        Utc::now().format("%Y%m%d%H%M%S%6f"),
        &suffix[..8]
    )
}

/// Binds configuration, collaborators, and handler overrides at construction.
#[derive(Default)]
pub struct WorkflowEngineBuilder {
    config: EngineConfig,
    collaborators: Collaborators,
    overrides: Vec<(TaskType, Option<Arc<dyn TaskHandler>>)>,
}

impl WorkflowEngineBuilder {
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.collaborators.transport = transport;
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.collaborators.notifier = notifier;
        self
    }

    pub fn transformer(mut self, transformer: Arc<dyn Transformer>) -> Self {
        self.collaborators.transformer = transformer;
        self
    }

    /// Replace the built-in handler for a task type.
    pub fn handler(mut self, task_type: TaskType, handler: Arc<dyn TaskHandler>) -> Self {
        self.overrides.push((task_type, Some(handler)));
        self
    }

    /// Leave a task type without a handler; tasks of that type abort their instance.
    pub fn without_handler(mut self, task_type: TaskType) -> Self {
        self.overrides.push((task_type, None));
        self
    }

    pub fn build(self) -> WorkflowEngine {
        let mut handlers = HandlerTable::standard(&self.collaborators);
        for (task_type, handler) in self.overrides {
            match handler {
                Some(handler) => handlers.set(task_type, handler),
                None => handlers.remove(task_type),
            }
        }

        let scheduler = TaskScheduler::new()
            .with_enforce_timeouts(self.config.enforce_timeouts)
            .with_default_timeout(self.config.default_task_timeout);

        WorkflowEngine {
            processes: RwLock::new(IndexMap::new()),
            instances: RwLock::new(InstanceStore::new(
                self.config.max_retained_instances,
                self.config.instance_ttl,
            )),
            executor: Executor::new(handlers, scheduler),
            config: self.config,
        }
    }
}
