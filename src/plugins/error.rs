// ABOUTME: Error types for plugin registration and lifecycle management
// ABOUTME: Lifecycle failures carry the plugin id and the underlying cause

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PluginError {
    #[error("Plugin already registered: {plugin_id}")]
    AlreadyRegistered { plugin_id: String },

    #[error("Plugin is disabled: {plugin_id}")]
    Disabled { plugin_id: String },

    #[error("Plugin not found: {plugin_id}")]
    NotFound { plugin_id: String },

    #[error("Plugin {plugin_id} failed during {stage}: {message}")]
    Lifecycle {
        plugin_id: String,
        stage: &'static str,
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, PluginError>;
