// ABOUTME: Main library module for the heartflow process-automation engine
// ABOUTME: Exports the model, engine, handlers, collaborators, plugins, and configuration

pub mod config;
pub mod engine;
pub mod integrations;
pub mod model;
pub mod plugins;
pub mod tasks;
pub mod template;

// Re-export commonly used types
pub use config::{init_logging, EngineConfig};
pub use engine::{
    EngineError, TaskResult, TaskStatus, WorkflowEngine, WorkflowEngineBuilder, WorkflowInstance,
};
pub use integrations::{HttpTransport, Notification, NotificationAck, Notifier, RemoteRequest, Transformer};
pub use model::{ProcessDefinition, RetryPolicy, Task, TaskType, ValidationError, Variables};
pub use plugins::{Plugin, PluginMetadata, PluginRegistry, PluginType};
pub use tasks::{HandlerTable, TaskHandler};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
