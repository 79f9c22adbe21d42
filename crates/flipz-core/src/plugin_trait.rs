use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::ComposeContext;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginMeta {
    pub id: String,
    pub name: String,
    pub version: String,
    pub dependencies: Vec<PluginDependency>,
    pub provides: Vec<String>,
    pub category: PluginCategory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginDependency {
    pub plugin_id: String,
    pub version_req: String,
    pub optional: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum PluginCategory {
    Core,
    Classifier,
    Composer,
    Session,
    Metrics,
    Gateway,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginHealth {
    pub status: HealthStatus,
    pub message: String,
    pub metrics: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
    Unknown,
}

/// Lifecycle plus the three per-exchange hooks. `on_message` runs first
/// (classification), `compose` fills the reply, `post_compose` gets a look
/// at the finished context before it is handed back to the gateway.
#[async_trait]
pub trait FlipzPlugin: Send + Sync {
    fn meta(&self) -> PluginMeta;

    async fn load(&mut self, config: toml::Value) -> Result<()>;
    async fn init(&mut self) -> Result<()>;
    async fn start(&mut self) -> Result<()>;
    async fn stop(&mut self) -> Result<()>;

    async fn on_message(&self, ctx: &mut ComposeContext) -> Result<()>;
    async fn compose(&self, ctx: &mut ComposeContext) -> Result<()>;
    async fn post_compose(&self, ctx: &mut ComposeContext) -> Result<()>;

    fn current_config(&self) -> serde_json::Value;
    async fn update_config(&mut self, config: serde_json::Value) -> Result<()>;

    async fn health(&self) -> PluginHealth;
}
