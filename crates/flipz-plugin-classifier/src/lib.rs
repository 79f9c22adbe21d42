use std::collections::HashMap;

use async_trait::async_trait;
use flipz_core::{
    ClassificationContext, ComposeContext, FlipzPlugin, HealthStatus, PluginCategory,
    PluginHealth, PluginMeta, Result,
};

pub mod vocab;

/// Classify one raw input. Always succeeds; anything undetected stays `None`.
///
/// Genre and mood scans deliberately keep iterating after a hit, so when
/// several tokens match, the last one in vocabulary order wins. That
/// last-match-wins rule comes from the original rule table and is load
/// bearing for callers; do not swap it for a short-circuit. Tech terms are
/// the opposite: first match wins.
pub fn classify(input: &str) -> ClassificationContext {
    let lower = input.to_lowercase();
    let mut ctx = ClassificationContext::default();

    for genre in vocab::GENRES {
        if lower.contains(genre) {
            ctx.genre = Some((*genre).to_string());
        }
    }

    for (mood, keywords) in vocab::MOOD_BUCKETS {
        if keywords.iter().any(|k| lower.contains(k)) {
            ctx.mood = Some((*mood).to_string());
        }
    }

    for term in vocab::TECH_TERMS {
        if lower.contains(term) {
            ctx.tech_term = Some((*term).to_string());
            break;
        }
    }

    ctx.keywords = lower
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|t| t.len() > 3 && !vocab::STOPWORDS.contains(t))
        .map(str::to_string)
        .collect();

    ctx
}

pub struct ClassifierPlugin {
    config: serde_json::Value,
}

impl ClassifierPlugin {
    pub fn create() -> Box<dyn FlipzPlugin> {
        Box::new(Self {
            config: serde_json::Value::Null,
        })
    }
}

#[async_trait]
impl FlipzPlugin for ClassifierPlugin {
    fn meta(&self) -> PluginMeta {
        PluginMeta {
            id: "classifier".into(),
            name: "Classifier Plugin".into(),
            version: "0.1.0".into(),
            dependencies: vec![],
            provides: vec!["classification".into()],
            category: PluginCategory::Classifier,
        }
    }

    async fn load(&mut self, config: toml::Value) -> Result<()> {
        tracing::info!("ClassifierPlugin loaded");
        self.config = serde_json::to_value(config.to_string())?;
        Ok(())
    }

    async fn init(&mut self) -> Result<()> {
        tracing::info!("ClassifierPlugin initialized");
        Ok(())
    }

    async fn start(&mut self) -> Result<()> {
        tracing::info!("ClassifierPlugin started");
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        tracing::info!("ClassifierPlugin stopped");
        Ok(())
    }

    async fn on_message(&self, ctx: &mut ComposeContext) -> Result<()> {
        ctx.classification = classify(&ctx.incoming.content);
        tracing::debug!(
            genre = ?ctx.classification.genre,
            mood = ?ctx.classification.mood,
            "Input classified"
        );
        Ok(())
    }

    async fn compose(&self, _ctx: &mut ComposeContext) -> Result<()> {
        Ok(())
    }

    async fn post_compose(&self, _ctx: &mut ComposeContext) -> Result<()> {
        Ok(())
    }

    fn current_config(&self) -> serde_json::Value {
        self.config.clone()
    }

    async fn update_config(&mut self, config: serde_json::Value) -> Result<()> {
        self.config = config;
        Ok(())
    }

    async fn health(&self) -> PluginHealth {
        let mut metrics = HashMap::new();
        metrics.insert("genres".into(), serde_json::json!(vocab::GENRES.len()));
        metrics.insert(
            "mood_buckets".into(),
            serde_json::json!(vocab::MOOD_BUCKETS.len()),
        );
        metrics.insert(
            "tech_terms".into(),
            serde_json::json!(vocab::TECH_TERMS.len()),
        );
        PluginHealth {
            status: HealthStatus::Healthy,
            message: "OK".into(),
            metrics,
        }
    }
}
