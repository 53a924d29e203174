// ABOUTME: Process execution engine: ordering, instance state machine, and the engine itself
// ABOUTME: Handles dependency resolution, retries, timeouts, cancellation, and instance retention

pub mod context;
pub mod dependency;
pub mod error;
pub mod executor;
pub mod instance;
pub mod result;
pub mod scheduler;
pub mod store;
pub mod workflow;

pub use context::{ExecutionContext, InstanceContext};
pub use dependency::{execution_order, DependencyGraph};
pub use error::{EngineError, Result};
pub use executor::Executor;
pub use instance::WorkflowInstance;
pub use result::{TaskResult, TaskStatus};
pub use scheduler::{RetryDecision, TaskScheduler};
pub use store::InstanceStore;
pub use workflow::{WorkflowEngine, WorkflowEngineBuilder};
