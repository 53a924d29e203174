// ABOUTME: Registry managing plugin registration, lookup, and lifecycle
// ABOUTME: Initialization and cleanup failures are logged per plugin and never abort the batch

use indexmap::IndexMap;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::error::{PluginError, Result};
use super::plugin::{Plugin, PluginMetadata, PluginType};

#[derive(Default)]
pub struct PluginRegistry {
    plugins: IndexMap<String, Arc<dyn Plugin>>,
    metadata: IndexMap<String, PluginMetadata>,
    initialized: HashSet<String>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin under `plugin_id`. Duplicate ids and disabled
    /// plugins are rejected.
    pub fn register(&mut self, plugin_id: impl Into<String>, plugin: Arc<dyn Plugin>) -> Result<()> {
        let plugin_id = plugin_id.into();
        if self.plugins.contains_key(&plugin_id) {
            warn!(plugin_id = %plugin_id, "Plugin already registered");
            return Err(PluginError::AlreadyRegistered { plugin_id });
        }

        let metadata = plugin.metadata();
        if !metadata.enabled {
            info!(plugin_id = %plugin_id, "Plugin is disabled");
            return Err(PluginError::Disabled { plugin_id });
        }

        info!(
            plugin_id = %plugin_id,
            plugin_type = ?metadata.plugin_type,
            version = %metadata.version,
            "Plugin registered"
        );
        self.plugins.insert(plugin_id.clone(), plugin);
        self.metadata.insert(plugin_id, metadata);
        Ok(())
    }

    /// Remove a plugin, running its cleanup first. A cleanup failure is
    /// logged and the plugin is removed anyway.
    pub async fn unregister(&mut self, plugin_id: &str) -> Result<()> {
        let plugin = self
            .plugins
            .shift_remove(plugin_id)
            .ok_or_else(|| PluginError::NotFound {
                plugin_id: plugin_id.to_string(),
            })?;
        self.metadata.shift_remove(plugin_id);
        self.initialized.remove(plugin_id);

        if let Err(e) = plugin.cleanup().await {
            error!(plugin_id = %plugin_id, error = %e, "Error during plugin cleanup");
        }
        info!(plugin_id = %plugin_id, "Plugin unregistered");
        Ok(())
    }

    pub fn get(&self, plugin_id: &str) -> Option<Arc<dyn Plugin>> {
        self.plugins.get(plugin_id).cloned()
    }

    /// Plugins of one type, lowest priority number first.
    pub fn by_type(&self, plugin_type: PluginType) -> Vec<Arc<dyn Plugin>> {
        let mut matching: Vec<(&PluginMetadata, &Arc<dyn Plugin>)> = self
            .metadata
            .iter()
            .filter(|(_, metadata)| metadata.plugin_type == plugin_type)
            .filter_map(|(id, metadata)| self.plugins.get(id).map(|p| (metadata, p)))
            .collect();
        matching.sort_by_key(|(metadata, _)| metadata.priority);
        matching.into_iter().map(|(_, p)| p.clone()).collect()
    }

    pub fn list(&self) -> IndexMap<String, PluginMetadata> {
        self.metadata.clone()
    }

    pub fn is_initialized(&self, plugin_id: &str) -> bool {
        self.initialized.contains(plugin_id)
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Initialize every plugin, reporting success per plugin id.
    pub async fn initialize_all(&mut self) -> IndexMap<String, bool> {
        let mut results = IndexMap::new();
        for (plugin_id, plugin) in &self.plugins {
            let success = match plugin.initialize().await {
                Ok(()) => {
                    info!(plugin_id = %plugin_id, "Plugin initialized");
                    true
                }
                Err(e) => {
                    let failure = PluginError::Lifecycle {
                        plugin_id: plugin_id.clone(),
                        stage: "initialize",
                        message: format!("{:#}", e),
                    };
                    error!(error = %failure, "Plugin initialization failed");
                    false
                }
            };
            if success {
                self.initialized.insert(plugin_id.clone());
            }
            results.insert(plugin_id.clone(), success);
        }
        results
    }

    pub async fn cleanup_all(&mut self) {
        for (plugin_id, plugin) in &self.plugins {
            match plugin.cleanup().await {
                Ok(()) => info!(plugin_id = %plugin_id, "Plugin cleaned up"),
                Err(e) => error!(plugin_id = %plugin_id, error = %e, "Error cleaning up plugin"),
            }
        }
        self.initialized.clear();
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("plugins", &self.metadata.keys().collect::<Vec<_>>())
            .field("initialized", &self.initialized)
            .finish()
    }
}
