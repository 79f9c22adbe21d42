use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineEvent {
    pub topic: String,
    pub payload: serde_json::Value,
    pub source_plugin: String,
}

#[derive(Debug)]
pub struct EventBus {
    sender: broadcast::Sender<EngineEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn broadcast(&self, event: EngineEvent) -> crate::error::Result<()> {
        self.sender.send(event).map_err(|e| {
            crate::error::FlipzError::EventBusError(format!("Failed to broadcast event: {e}"))
        })?;
        Ok(())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.sender.subscribe()
    }

    /// Emitters that fire on timers check this so a bus with no listeners
    /// does not turn every tick into an error.
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn broadcast_reaches_subscriber() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        bus.broadcast(EngineEvent {
            topic: "metrics.update".into(),
            payload: serde_json::json!({"name": "harmony", "value": 88.0}),
            source_plugin: "metrics".into(),
        })
        .unwrap();
        let event = rx.recv().await.unwrap();
        assert_eq!(event.topic, "metrics.update");
        assert_eq!(event.source_plugin, "metrics");
    }

    #[test]
    fn broadcast_without_subscribers_is_an_error() {
        let bus = EventBus::new(8);
        assert_eq!(bus.receiver_count(), 0);
        let result = bus.broadcast(EngineEvent {
            topic: "noop".into(),
            payload: serde_json::Value::Null,
            source_plugin: "test".into(),
        });
        assert!(result.is_err());
    }
}
