use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use flipz_core::{
    ActionTag, ComposeContext, ConversationState, FlipzPlugin, HealthStatus, Message,
    PluginCategory, PluginHealth, PluginMeta, Result, Sender, SessionPhase,
};

#[derive(Debug, Default)]
struct ChannelSession {
    log: Vec<Message>,
    state: ConversationState,
    phase: SessionPhase,
}

/// In-memory session store. One entry per channel, nothing persisted;
/// dropping the service is the teardown.
pub struct SessionService {
    sessions: Mutex<HashMap<String, ChannelSession>>,
    history_limit: usize,
    next_id: AtomicU64,
}

impl SessionService {
    pub fn new(history_limit: usize) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            history_limit,
            next_id: AtomicU64::new(1),
        }
    }

    /// Append a message to a channel's log. Ids are process-unique and the
    /// timestamp is clamped so the log never goes backwards in time, even
    /// if the wall clock does. Only the head of the log is ever trimmed.
    pub fn append(
        &self,
        channel_id: &str,
        sender: Sender,
        text: &str,
        category: Option<String>,
        payload: Option<serde_json::Value>,
    ) -> Message {
        let mut sessions = self.sessions.lock().unwrap();
        let session = sessions.entry(channel_id.to_string()).or_default();

        let mut timestamp = Utc::now();
        if let Some(last) = session.log.last() {
            if timestamp < last.timestamp {
                timestamp = last.timestamp;
            }
        }

        let message = Message {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            text: text.to_string(),
            sender,
            timestamp,
            category,
            payload,
        };
        session.log.push(message.clone());

        if session.log.len() > self.history_limit {
            let excess = session.log.len() - self.history_limit;
            session.log.drain(..excess);
        }

        message
    }

    /// User message sent, reply pending.
    pub fn begin_exchange(&self, channel_id: &str) {
        let mut sessions = self.sessions.lock().unwrap();
        let session = sessions.entry(channel_id.to_string()).or_default();
        session.phase = SessionPhase::AwaitingResponse;
    }

    /// Reply delivered: back to idle, depth up by exactly one, topic and
    /// action overwritten when the exchange detected something new,
    /// keywords appended to the interest trail (duplicates and all).
    pub fn complete_exchange(
        &self,
        channel_id: &str,
        topic: Option<String>,
        action: Option<ActionTag>,
        interests: &[String],
    ) {
        let mut sessions = self.sessions.lock().unwrap();
        let session = sessions.entry(channel_id.to_string()).or_default();
        session.phase = SessionPhase::Idle;
        session.state.depth += 1;
        if topic.is_some() {
            session.state.last_topic = topic;
        }
        if action.is_some() {
            session.state.last_action = action;
        }
        session.state.interests.extend(interests.iter().cloned());
    }

    pub fn state(&self, channel_id: &str) -> ConversationState {
        let sessions = self.sessions.lock().unwrap();
        sessions
            .get(channel_id)
            .map(|s| s.state.clone())
            .unwrap_or_default()
    }

    pub fn phase(&self, channel_id: &str) -> SessionPhase {
        let sessions = self.sessions.lock().unwrap();
        sessions.get(channel_id).map(|s| s.phase).unwrap_or_default()
    }

    pub fn history(&self, channel_id: &str) -> Vec<Message> {
        let sessions = self.sessions.lock().unwrap();
        sessions
            .get(channel_id)
            .map(|s| s.log.clone())
            .unwrap_or_default()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }
}

pub struct SessionPlugin {
    config: serde_json::Value,
    service: Arc<SessionService>,
}

impl SessionPlugin {
    pub fn create(service: Arc<SessionService>) -> Box<dyn FlipzPlugin> {
        Box::new(Self {
            config: serde_json::Value::Null,
            service,
        })
    }
}

#[async_trait]
impl FlipzPlugin for SessionPlugin {
    fn meta(&self) -> PluginMeta {
        PluginMeta {
            id: "session".into(),
            name: "Session Plugin".into(),
            version: "0.1.0".into(),
            dependencies: vec![],
            provides: vec!["session".into()],
            category: PluginCategory::Session,
        }
    }

    async fn load(&mut self, config: toml::Value) -> Result<()> {
        tracing::info!("SessionPlugin loaded");
        self.config = serde_json::to_value(config.to_string())?;
        Ok(())
    }

    async fn init(&mut self) -> Result<()> {
        tracing::info!("SessionPlugin initialized");
        Ok(())
    }

    async fn start(&mut self) -> Result<()> {
        tracing::info!("SessionPlugin started");
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        tracing::info!("SessionPlugin stopped");
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
        metrics.insert(
            "active_sessions".into(),
            serde_json::json!(self.service.session_count()),
        );
        PluginHealth {
            status: HealthStatus::Healthy,
            message: "OK".into(),
            metrics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_increases_by_one_per_exchange() {
        let service = SessionService::new(64);
        assert_eq!(service.state("cli").depth, 0);
        for expected in 1..=3 {
            service.begin_exchange("cli");
            service.complete_exchange("cli", None, None, &[]);
            assert_eq!(service.state("cli").depth, expected);
        }
    }

    #[test]
    fn phase_follows_the_exchange() {
        let service = SessionService::new(64);
        assert_eq!(service.phase("cli"), SessionPhase::Idle);
        service.begin_exchange("cli");
        assert_eq!(service.phase("cli"), SessionPhase::AwaitingResponse);
        service.complete_exchange("cli", None, None, &[]);
        assert_eq!(service.phase("cli"), SessionPhase::Idle);
    }

    #[test]
    fn timestamps_never_decrease_within_a_log() {
        let service = SessionService::new(64);
        for i in 0..20 {
            service.append("cli", Sender::User, &format!("msg {i}"), None, None);
        }
        let log = service.history("cli");
        for pair in log.windows(2) {
            assert!(pair[1].timestamp >= pair[0].timestamp);
        }
    }

    #[test]
    fn message_ids_are_unique() {
        let service = SessionService::new(64);
        let a = service.append("cli", Sender::User, "one", None, None);
        let b = service.append("other", Sender::System, "two", None, None);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn log_head_is_trimmed_beyond_the_limit() {
        let service = SessionService::new(3);
        for i in 0..5 {
            service.append("cli", Sender::User, &format!("msg {i}"), None, None);
        }
        let log = service.history("cli");
        assert_eq!(log.len(), 3);
        assert_eq!(log[0].text, "msg 2");
        assert_eq!(log[2].text, "msg 4");
    }

    #[test]
    fn topic_and_action_only_overwrite_when_detected() {
        let service = SessionService::new(64);
        service.begin_exchange("cli");
        service.complete_exchange(
            "cli",
            Some("trap".into()),
            Some(ActionTag::PlayBeat),
            &["cowbells".into()],
        );
        service.begin_exchange("cli");
        service.complete_exchange("cli", None, None, &[]);

        let state = service.state("cli");
        assert_eq!(state.depth, 2);
        assert_eq!(state.last_topic.as_deref(), Some("trap"));
        assert_eq!(state.last_action, Some(ActionTag::PlayBeat));
        assert_eq!(state.interests, vec!["cowbells".to_string()]);
    }

    #[test]
    fn interests_keep_insertion_order_and_duplicates() {
        let service = SessionService::new(64);
        service.complete_exchange("cli", None, None, &["trap".into(), "cowbells".into()]);
        service.complete_exchange("cli", None, None, &["trap".into()]);
        assert_eq!(
            service.state("cli").interests,
            vec!["trap".to_string(), "cowbells".to_string(), "trap".to_string()]
        );
    }

    #[test]
    fn channels_are_isolated() {
        let service = SessionService::new(64);
        service.complete_exchange("a", Some("house".into()), None, &[]);
        assert_eq!(service.state("b").depth, 0);
        assert!(service.state("b").last_topic.is_none());
        assert_eq!(service.session_count(), 2);
    }
}
