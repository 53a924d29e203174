// ABOUTME: Process and task definition model for the heartflow engine
// ABOUTME: Exports immutable definitions, retry policies, and definition loading

pub mod duration;
pub mod error;
pub mod process;
pub mod task;

pub use error::{ModelError, Result, ValidationError};
pub use process::ProcessDefinition;
pub use task::{RetryPolicy, Task, TaskType};

/// Instance and definition variables, kept in insertion order.
pub type Variables = serde_json::Map<String, serde_json::Value>;
