use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};

use crate::error::{FlipzError, Result};
use crate::event_bus::EventBus;
use crate::plugin_trait::{FlipzPlugin, PluginHealth};
use crate::types::ComposeContext;

pub struct PluginLoader {
    plugins: HashMap<String, Box<dyn FlipzPlugin>>,
    order: Vec<String>,
    event_bus: Arc<EventBus>,
}

impl PluginLoader {
    pub fn new(event_bus: Arc<EventBus>) -> Self {
        Self {
            plugins: HashMap::new(),
            order: Vec::new(),
            event_bus,
        }
    }

    pub fn register(&mut self, plugin: Box<dyn FlipzPlugin>) {
        let meta = plugin.meta();
        info!("Registered plugin: {} ({})", meta.name, meta.id);
        self.plugins.insert(meta.id, plugin);
    }

    pub fn resolve_order(&mut self) -> Result<()> {
        let mut visited: HashMap<String, bool> = HashMap::new();
        let mut order: Vec<String> = Vec::new();

        let mut ids: Vec<String> = self.plugins.keys().cloned().collect();
        ids.sort();
        for id in &ids {
            if !visited.contains_key(id) {
                self.topo_visit(id, &mut visited, &mut order)?;
            }
        }

        self.order = order;
        info!("Plugin load order: {:?}", self.order);
        Ok(())
    }

    fn topo_visit(
        &self,
        id: &str,
        visited: &mut HashMap<String, bool>,
        order: &mut Vec<String>,
    ) -> Result<()> {
        if let Some(&in_progress) = visited.get(id) {
            if in_progress {
                return Err(FlipzError::DependencyError(format!(
                    "Circular dependency detected at: {id}"
                )));
            }
            return Ok(());
        }

        visited.insert(id.to_string(), true);

        if let Some(plugin) = self.plugins.get(id) {
            let meta = plugin.meta();
            for dep in &meta.dependencies {
                if self.plugins.contains_key(&dep.plugin_id) {
                    self.topo_visit(&dep.plugin_id, visited, order)?;
                } else if !dep.optional {
                    return Err(FlipzError::DependencyError(format!(
                        "Required dependency '{}' not found for plugin '{}'",
                        dep.plugin_id, id
                    )));
                } else {
                    warn!(
                        "Optional dependency '{}' not found for plugin '{}'",
                        dep.plugin_id, id
                    );
                }
            }
        }

        visited.insert(id.to_string(), false);
        order.push(id.to_string());
        Ok(())
    }

    pub async fn start_all(&mut self, config: &toml::Value) -> Result<()> {
        self.resolve_order()?;
        let order = self.order.clone();

        for id in &order {
            if let Some(plugin) = self.plugins.get_mut(id) {
                let plugin_config = config
                    .get("plugins")
                    .and_then(|p| p.get(id))
                    .cloned()
                    .unwrap_or(toml::Value::Table(toml::map::Map::new()));

                info!("Loading plugin: {id}");
                plugin.load(plugin_config).await?;
                info!("Initializing plugin: {id}");
                plugin.init().await?;
                info!("Starting plugin: {id}");
                plugin.start().await?;
            }
        }

        Ok(())
    }

    pub async fn stop_all(&mut self) -> Result<()> {
        let order: Vec<String> = self.order.iter().rev().cloned().collect();

        for id in &order {
            if let Some(plugin) = self.plugins.get_mut(id) {
                info!("Stopping plugin: {id}");
                if let Err(e) = plugin.stop().await {
                    warn!("Error stopping plugin {id}: {e}");
                }
            }
        }

        Ok(())
    }

    /// Runs one exchange through every plugin, phase by phase, in load
    /// order: classification hooks first, then composition, then the
    /// post pass. The gateway reads the reply off the context afterwards.
    pub async fn dispatch_message(&self, ctx: &mut ComposeContext) -> Result<()> {
        for id in &self.order {
            if let Some(plugin) = self.plugins.get(id) {
                plugin.on_message(ctx).await?;
            }
        }
        for id in &self.order {
            if let Some(plugin) = self.plugins.get(id) {
                plugin.compose(ctx).await?;
            }
        }
        for id in &self.order {
            if let Some(plugin) = self.plugins.get(id) {
                plugin.post_compose(ctx).await?;
            }
        }
        Ok(())
    }

    pub async fn health_all(&self) -> HashMap<String, PluginHealth> {
        let mut report = HashMap::new();
        for (id, plugin) in &self.plugins {
            report.insert(id.clone(), plugin.health().await);
        }
        report
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }

    pub fn load_order(&self) -> &[String] {
        &self.order
    }
}
