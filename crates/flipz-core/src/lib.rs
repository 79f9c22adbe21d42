pub mod config;
pub mod error;
pub mod event_bus;
pub mod plugin_loader;
pub mod plugin_trait;
pub mod rng;
pub mod types;

pub use config::{load_config, load_config_or_default};
pub use error::{FlipzError, Result};
pub use event_bus::{EngineEvent, EventBus};
pub use plugin_loader::PluginLoader;
pub use plugin_trait::{
    FlipzPlugin, HealthStatus, PluginCategory, PluginDependency, PluginHealth, PluginMeta,
};
pub use rng::{RandomSource, ScriptedSource, ThreadRngSource};
pub use types::{
    ActionTag, ClassificationContext, ComposeContext, ComposedReply, ConversationState,
    IncomingMessage, Message, Sender, SessionPhase,
};
