use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    System,
}

/// Follow-up action a composed reply may ask the presentation layer to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionTag {
    GenerateLyrics,
    PlayBeat,
    ShowTutorial,
}

/// A single entry in a channel's message log. Immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: u64,
    pub text: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
    pub category: Option<String>,
    pub payload: Option<serde_json::Value>,
}

/// Per-channel conversational memory. `depth` only ever grows; `interests`
/// keeps insertion order and may contain duplicates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationState {
    pub depth: u32,
    pub last_topic: Option<String>,
    pub last_action: Option<ActionTag>,
    pub interests: Vec<String>,
}

/// Transient result of classifying one input. Recomputed per message,
/// never stored. Absent detections are simply `None`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassificationContext {
    pub genre: Option<String>,
    pub mood: Option<String>,
    pub tech_term: Option<String>,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub source: String,
    pub channel_id: String,
    pub author: String,
    pub content: String,
    pub metadata: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComposedReply {
    pub text: String,
    pub action: Option<ActionTag>,
    pub category: Option<String>,
}

/// Mutable context threaded through the plugin hooks for one exchange:
/// the classifier fills `classification`, the composer fills `reply`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComposeContext {
    pub incoming: IncomingMessage,
    pub state: ConversationState,
    pub classification: ClassificationContext,
    pub reply: Option<ComposedReply>,
}

impl ComposeContext {
    pub fn new(incoming: IncomingMessage, state: ConversationState) -> Self {
        Self {
            incoming,
            state,
            classification: ClassificationContext::default(),
            reply: None,
        }
    }
}

/// Idle until a user message starts an exchange, awaiting until the reply
/// lands. The loop never terminates on its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    #[default]
    Idle,
    AwaitingResponse,
}
