use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use flipz_core::{EventBus, PluginLoader, RandomSource, ThreadRngSource};
use flipz_plugin_classifier::ClassifierPlugin;
use flipz_plugin_composer::{ComposerPlugin, ComposerService};
use flipz_plugin_gateway_cli::{run_chat_loop, GatewayCliPlugin, GatewayConfig};
use flipz_plugin_metrics::{MetricsPlugin, MetricsService};
use flipz_plugin_session::{SessionPlugin, SessionService};

fn int_setting(config: &toml::Value, plugin: &str, key: &str, default: i64) -> i64 {
    config
        .get("plugins")
        .and_then(|p| p.get(plugin))
        .and_then(|s| s.get(key))
        .and_then(|v| v.as_integer())
        .unwrap_or(default)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    tracing::info!("FLIPZ engine starting...");

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "flipz.toml".to_string());
    let config = flipz_core::load_config_or_default(Path::new(&config_path))?;

    let bus = Arc::new(EventBus::new(64));
    let rng: Arc<dyn RandomSource> = Arc::new(ThreadRngSource);

    let history_limit = int_setting(&config, "session", "history_limit", 64) as usize;
    let metrics_interval = int_setting(&config, "metrics", "interval_ms", 2000) as u64;

    let session = Arc::new(SessionService::new(history_limit));
    let composer = Arc::new(ComposerService::new(Arc::clone(&rng)));
    let metrics = Arc::new(MetricsService::new(
        Arc::clone(&bus),
        Arc::clone(&rng),
        Duration::from_millis(metrics_interval),
    ));

    let mut loader = PluginLoader::new(Arc::clone(&bus));
    loader.register(ClassifierPlugin::create());
    loader.register(ComposerPlugin::create(Arc::clone(&composer)));
    loader.register(SessionPlugin::create(Arc::clone(&session)));
    loader.register(MetricsPlugin::create(Arc::clone(&metrics)));
    loader.register(GatewayCliPlugin::create());
    loader.start_all(&config).await?;

    // Keep one subscriber draining the bus so the emitters always have a
    // listener; updates surface at debug level.
    let mut bus_rx = bus.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = bus_rx.recv().await {
            tracing::debug!(topic = %event.topic, source = %event.source_plugin, "bus event");
        }
    });

    let gateway_config = GatewayConfig::from_toml(&config);
    tokio::select! {
        result = run_chat_loop(
            &loader,
            Arc::clone(&session),
            Arc::clone(&composer),
            Arc::clone(&metrics),
            Arc::clone(&rng),
            gateway_config,
        ) => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupt received");
        }
    }

    loader.stop_all().await?;
    tracing::info!("Shutting down...");
    Ok(())
}
