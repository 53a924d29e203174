// ABOUTME: Variable substitution and condition evaluation for task configuration
// ABOUTME: Both operate on the live variables of a workflow instance

pub mod condition;
pub mod resolver;

pub use condition::{Condition, Operator};
pub use resolver::{display_value, lookup, VariableResolver};
