//! End-to-end exchanges through the full plugin pipeline: register the
//! real plugins, dispatch raw input, and check the classified context,
//! the composed reply and the conversation state together.

use std::collections::HashMap;
use std::sync::Arc;

use flipz_core::{
    ActionTag, ComposeContext, EventBus, IncomingMessage, PluginLoader, RandomSource, Sender,
    ThreadRngSource,
};
use flipz_plugin_classifier::ClassifierPlugin;
use flipz_plugin_composer::{ComposerPlugin, ComposerService};
use flipz_plugin_session::{SessionPlugin, SessionService};

fn incoming(content: &str) -> IncomingMessage {
    IncomingMessage {
        source: "test".into(),
        channel_id: "cli".into(),
        author: "you".into(),
        content: content.into(),
        metadata: HashMap::new(),
    }
}

async fn pipeline() -> (PluginLoader, Arc<SessionService>) {
    let bus = Arc::new(EventBus::new(16));
    let rng: Arc<dyn RandomSource> = Arc::new(ThreadRngSource);
    let session = Arc::new(SessionService::new(64));
    let composer = Arc::new(ComposerService::new(rng));

    let mut loader = PluginLoader::new(bus);
    loader.register(ClassifierPlugin::create());
    loader.register(ComposerPlugin::create(composer));
    loader.register(SessionPlugin::create(Arc::clone(&session)));
    loader
        .start_all(&toml::Value::Table(toml::map::Map::new()))
        .await
        .unwrap();
    (loader, session)
}

async fn exchange(loader: &PluginLoader, session: &SessionService, input: &str) -> ComposeContext {
    session.append("cli", Sender::User, input, None, None);
    session.begin_exchange("cli");

    let mut ctx = ComposeContext::new(incoming(input), session.state("cli"));
    loader.dispatch_message(&mut ctx).await.unwrap();

    let reply = ctx.reply.clone().expect("composer filled a reply");
    session.append("cli", Sender::System, &reply.text, reply.category.clone(), None);
    let topic = ctx
        .classification
        .genre
        .clone()
        .or_else(|| ctx.classification.mood.clone());
    session.complete_exchange("cli", topic, reply.action, &ctx.classification.keywords);
    ctx
}

#[tokio::test]
async fn trap_beat_request_runs_the_whole_pipe() {
    let (loader, session) = pipeline().await;
    let ctx = exchange(&loader, &session, "yo can you make a trap beat").await;

    assert_eq!(ctx.classification.genre.as_deref(), Some("trap"));
    let reply = ctx.reply.unwrap();
    assert_eq!(reply.action, Some(ActionTag::PlayBeat));
    assert!(reply.text.contains("trap"));
    let has_tempo = reply.text.split_whitespace().any(|t| {
        t.trim_matches(|c: char| !c.is_ascii_digit())
            .parse::<u32>()
            .map(|n| (120..160).contains(&n))
            .unwrap_or(false)
    });
    assert!(has_tempo, "no tempo token in: {}", reply.text);

    let state = session.state("cli");
    assert_eq!(state.last_topic.as_deref(), Some("trap"));
    assert_eq!(state.last_action, Some(ActionTag::PlayBeat));
}

#[tokio::test]
async fn dark_write_request_reflects_the_mood() {
    let (loader, session) = pipeline().await;
    let ctx = exchange(&loader, &session, "write me something dark").await;

    assert_eq!(ctx.classification.mood.as_deref(), Some("dark"));
    assert!(ctx.classification.genre.is_none());
    let reply = ctx.reply.unwrap();
    assert!(reply.text.contains("dark"));
    assert_eq!(session.state("cli").last_topic.as_deref(), Some("dark"));
}

#[tokio::test]
async fn three_messages_take_depth_from_zero_to_three() {
    let (loader, session) = pipeline().await;
    assert_eq!(session.state("cli").depth, 0);

    exchange(&loader, &session, "hello there").await;
    exchange(&loader, &session, "make it chill").await;
    exchange(&loader, &session, "now a drill beat").await;

    assert_eq!(session.state("cli").depth, 3);
}

#[tokio::test]
async fn message_log_stays_ordered_across_exchanges() {
    let (loader, session) = pipeline().await;
    exchange(&loader, &session, "hello there").await;
    exchange(&loader, &session, "write me a verse").await;

    let log = session.history("cli");
    assert_eq!(log.len(), 4);
    assert_eq!(log[0].sender, Sender::User);
    assert_eq!(log[1].sender, Sender::System);
    for pair in log.windows(2) {
        assert!(pair[1].timestamp >= pair[0].timestamp);
        assert!(pair[1].id > pair[0].id);
    }
}

#[tokio::test]
async fn keyword_free_input_still_gets_a_reply() {
    let (loader, session) = pipeline().await;
    let ctx = exchange(&loader, &session, "hmm okay then").await;

    let reply = ctx.reply.unwrap();
    assert!(reply.action.is_none());
    assert!(!reply.text.is_empty());
}
