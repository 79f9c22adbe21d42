use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use flipz_core::{
    ComposeContext, EngineEvent, EventBus, FlipzPlugin, HealthStatus, PluginCategory,
    PluginHealth, PluginMeta, RandomSource, Result,
};
use tokio::task::JoinHandle;

/// One fake dashboard figure. A tick nudges the value by a bounded random
/// step and clamps it, so it can never leave `[min, max]` no matter how
/// long the emitter runs.
#[derive(Debug, Clone)]
pub struct SimulatedMetric {
    pub name: &'static str,
    pub value: f64,
    pub min: f64,
    pub max: f64,
    pub max_step: f64,
}

impl SimulatedMetric {
    pub fn tick(&mut self, rng: &dyn RandomSource) {
        let step = rng.range_f64(-self.max_step, self.max_step);
        self.value = (self.value + step).clamp(self.min, self.max);
    }
}

/// The board shown by /stats: token price, 24h volume, network load and
/// the harmony score. All numbers are invented; only the bounds are real.
pub fn default_board() -> Vec<SimulatedMetric> {
    vec![
        SimulatedMetric {
            name: "flipz_price_usd",
            value: 0.0042,
            min: 0.0001,
            max: 0.01,
            max_step: 0.0004,
        },
        SimulatedMetric {
            name: "volume_24h_usd",
            value: 120_000.0,
            min: 10_000.0,
            max: 500_000.0,
            max_step: 8_000.0,
        },
        SimulatedMetric {
            name: "network_load_pct",
            value: 42.0,
            min: 0.0,
            max: 100.0,
            max_step: 6.0,
        },
        SimulatedMetric {
            name: "harmony_score_pct",
            value: 87.0,
            min: 0.0,
            max: 100.0,
            max_step: 3.0,
        },
    ]
}

/// Owns one interval task per metric. The emitters are independent of each
/// other and of the chat loop; `stop` aborts them, which is also what
/// `Drop` does, so a torn-down service cannot leak timers.
pub struct MetricsService {
    board: Arc<Mutex<Vec<SimulatedMetric>>>,
    bus: Arc<EventBus>,
    rng: Arc<dyn RandomSource>,
    interval: Duration,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl MetricsService {
    pub fn new(bus: Arc<EventBus>, rng: Arc<dyn RandomSource>, interval: Duration) -> Self {
        Self {
            board: Arc::new(Mutex::new(default_board())),
            bus,
            rng,
            interval,
            handles: Mutex::new(Vec::new()),
        }
    }

    pub fn start(&self) {
        let count = self.board.lock().unwrap().len();
        let mut handles = self.handles.lock().unwrap();
        if !handles.is_empty() {
            return;
        }
        for idx in 0..count {
            let board = Arc::clone(&self.board);
            let bus = Arc::clone(&self.bus);
            let rng = Arc::clone(&self.rng);
            // Stagger the periods a little so the emitters do not tick in
            // lockstep; there is no ordering guarantee between them.
            let period = self.interval + Duration::from_millis(idx as u64 * 250);
            handles.push(tokio::spawn(async move {
                let mut ticker = tokio::time::interval(period);
                loop {
                    ticker.tick().await;
                    let (name, value) = {
                        let mut board = board.lock().unwrap();
                        let metric = &mut board[idx];
                        metric.tick(rng.as_ref());
                        (metric.name, metric.value)
                    };
                    if bus.receiver_count() > 0 {
                        // The last subscriber can still drop between the
                        // count check and the send; a lost update only
                        // matters at debug level.
                        if let Err(e) = bus.broadcast(EngineEvent {
                            topic: "metrics.update".into(),
                            payload: serde_json::json!({ "name": name, "value": value }),
                            source_plugin: "metrics".into(),
                        }) {
                            tracing::debug!("Metric update dropped: {e}");
                        }
                    }
                }
            }));
        }
    }

    pub fn stop(&self) {
        let mut handles = self.handles.lock().unwrap();
        for handle in handles.drain(..) {
            handle.abort();
        }
    }

    pub fn snapshot(&self) -> Vec<(String, f64)> {
        self.board
            .lock()
            .unwrap()
            .iter()
            .map(|m| (m.name.to_string(), m.value))
            .collect()
    }
}

impl Drop for MetricsService {
    fn drop(&mut self) {
        self.stop();
    }
}

pub struct MetricsPlugin {
    config: serde_json::Value,
    service: Arc<MetricsService>,
}

impl MetricsPlugin {
    pub fn create(service: Arc<MetricsService>) -> Box<dyn FlipzPlugin> {
        Box::new(Self {
            config: serde_json::Value::Null,
            service,
        })
    }
}

#[async_trait]
impl FlipzPlugin for MetricsPlugin {
    fn meta(&self) -> PluginMeta {
        PluginMeta {
            id: "metrics".into(),
            name: "Metrics Plugin".into(),
            version: "0.1.0".into(),
            dependencies: vec![],
            provides: vec!["metrics".into()],
            category: PluginCategory::Metrics,
        }
    }

    async fn load(&mut self, config: toml::Value) -> Result<()> {
        tracing::info!("MetricsPlugin loaded");
        self.config = serde_json::to_value(config.to_string())?;
        Ok(())
    }

    async fn init(&mut self) -> Result<()> {
        tracing::info!("MetricsPlugin initialized");
        Ok(())
    }

    async fn start(&mut self) -> Result<()> {
        tracing::info!("MetricsPlugin started");
        self.service.start();
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        tracing::info!("MetricsPlugin stopped");
        self.service.stop();
        Ok(())
    }

    async fn on_message(&self, _ctx: &mut ComposeContext) -> Result<()> {
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
        for (name, value) in self.service.snapshot() {
            metrics.insert(name, serde_json::json!(value));
        }
        PluginHealth {
            status: HealthStatus::Healthy,
            message: "OK".into(),
            metrics,
        }
    }
}
