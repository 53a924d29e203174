// ABOUTME: Plugin contract and registry for pluggable system adapters
// ABOUTME: Registries are constructed explicitly and are not consulted during task dispatch

pub mod error;
pub mod plugin;
pub mod registry;

pub use error::{PluginError, Result};
pub use plugin::{Plugin, PluginMetadata, PluginType};
pub use registry::PluginRegistry;
