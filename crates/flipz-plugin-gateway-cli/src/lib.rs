use std::collections::HashMap;
use std::io::Write as _;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use flipz_core::{
    ActionTag, ComposeContext, ComposedReply, FlipzPlugin, HealthStatus, IncomingMessage,
    PluginCategory, PluginDependency, PluginHealth, PluginLoader, PluginMeta, RandomSource,
    Result, Sender,
};
use flipz_plugin_composer::{templates, ComposerService};
use flipz_plugin_metrics::MetricsService;
use flipz_plugin_session::SessionService;
use tokio::io::AsyncBufReadExt;

pub mod player;

use player::{PlayOutcome, Player};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Generate(Option<String>),
    Play,
    Help,
    Stats,
    Quit,
    Unknown(String),
}

/// Slash commands are recognized by prefix match against the raw input,
/// the same way the original UI did it. `/generate` takes an optional
/// topic argument.
pub fn parse_command(input: &str) -> Command {
    if let Some(rest) = input.strip_prefix("/generate") {
        let arg = rest.trim();
        return Command::Generate(if arg.is_empty() {
            None
        } else {
            Some(arg.to_string())
        });
    }
    if input.starts_with("/play") {
        return Command::Play;
    }
    if input.starts_with("/help") {
        return Command::Help;
    }
    if input.starts_with("/stats") {
        return Command::Stats;
    }
    if input.starts_with("/quit") || input.starts_with("/exit") {
        return Command::Quit;
    }
    Command::Unknown(input.to_string())
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub prompt: String,
    pub channel_id: String,
    pub think_min_ms: u64,
    pub think_max_ms: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            prompt: "you>".into(),
            channel_id: "cli".into(),
            think_min_ms: 600,
            think_max_ms: 1400,
        }
    }
}

impl GatewayConfig {
    pub fn from_toml(config: &toml::Value) -> Self {
        let section = config.get("plugins").and_then(|p| p.get("gateway-cli"));
        let defaults = Self::default();
        let int = |key: &str, default: u64| {
            section
                .and_then(|s| s.get(key))
                .and_then(|v| v.as_integer())
                .map(|v| v as u64)
                .unwrap_or(default)
        };
        Self {
            prompt: section
                .and_then(|s| s.get("prompt"))
                .and_then(|v| v.as_str())
                .unwrap_or(&defaults.prompt)
                .to_string(),
            channel_id: defaults.channel_id.clone(),
            think_min_ms: int("think_min_ms", defaults.think_min_ms),
            think_max_ms: int("think_max_ms", defaults.think_max_ms),
        }
    }
}

/// The terminal chat loop. Blocks on stdin until EOF or /quit; every
/// submitted line counts as a user gesture for the playback simulation.
pub async fn run_chat_loop(
    loader: &PluginLoader,
    session: Arc<SessionService>,
    composer: Arc<ComposerService>,
    metrics: Arc<MetricsService>,
    rng: Arc<dyn RandomSource>,
    config: GatewayConfig,
) -> Result<()> {
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    let mut player = Player::new();

    println!("FLIPZ studio online. {}", templates::TUTORIAL_PROMPT);
    // The splash screen tries to start the ambient beat before any input
    // has arrived, which the autoplay rule rejects; it resumes on the
    // first gesture instead.
    if player.try_play() == PlayOutcome::Rejected {
        println!("[player] ambient beat held back until your first message");
    }

    loop {
        print!("{} ", config.prompt);
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }

        if player.note_user_gesture() {
            println!("[player] beat resumed");
        }

        if line.starts_with('/') {
            match parse_command(&line) {
                Command::Quit => break,
                command => {
                    handle_command(command, &session, &composer, &metrics, &mut player, &config)
                }
            }
            continue;
        }

        handle_chat(
            &line,
            loader,
            &session,
            &composer,
            rng.as_ref(),
            &mut player,
            &config,
        )
        .await;
    }

    tracing::info!("Chat loop finished");
    Ok(())
}

fn handle_command(
    command: Command,
    session: &SessionService,
    composer: &ComposerService,
    metrics: &MetricsService,
    player: &mut Player,
    config: &GatewayConfig,
) {
    let channel = config.channel_id.as_str();
    match command {
        Command::Generate(arg) => {
            let topic = arg.or_else(|| session.state(channel).last_topic);
            let sheet = composer.generate_lyrics(topic.as_deref());
            session.append(channel, Sender::System, &sheet, Some("lyrics".into()), None);
            println!("{sheet}");
        }
        Command::Play => match composer.beat_line(session.state(channel).last_topic.as_deref()) {
            Ok(text) => {
                session.append(channel, Sender::System, &text, Some("beat".into()), None);
                println!("FLIPZ: {text}");
                announce_playback(player.try_play());
            }
            Err(e) => {
                tracing::warn!("Beat line failed: {e}");
                println!("FLIPZ: {}", templates::GLITCH_LINE);
            }
        },
        Command::Help => {
            session.append(
                channel,
                Sender::System,
                templates::TUTORIAL_PROMPT,
                Some("tutorial".into()),
                None,
            );
            println!("FLIPZ: {}", templates::TUTORIAL_PROMPT);
        }
        Command::Stats => {
            let snapshot = metrics.snapshot();
            session.append(
                channel,
                Sender::System,
                "stats board",
                Some("stats".into()),
                Some(serde_json::json!(snapshot
                    .iter()
                    .map(|(name, value)| (name.clone(), *value))
                    .collect::<HashMap<_, _>>())),
            );
            for (name, value) in snapshot {
                println!("{name:>18}: {value:.4}");
            }
        }
        Command::Quit => {}
        Command::Unknown(input) => {
            println!("Unknown command: {input}. Try /help.");
        }
    }
}

async fn handle_chat(
    line: &str,
    loader: &PluginLoader,
    session: &SessionService,
    composer: &ComposerService,
    rng: &dyn RandomSource,
    player: &mut Player,
    config: &GatewayConfig,
) {
    let channel = config.channel_id.as_str();
    session.append(channel, Sender::User, line, None, None);
    session.begin_exchange(channel);

    let incoming = IncomingMessage {
        source: "cli".into(),
        channel_id: channel.to_string(),
        author: "you".into(),
        content: line.to_string(),
        metadata: HashMap::new(),
    };
    let mut ctx = ComposeContext::new(incoming, session.state(channel));

    println!("FLIPZ is typing...");
    tokio::time::sleep(Duration::from_millis(thinking_delay(rng, config))).await;

    if let Err(e) = loader.dispatch_message(&mut ctx).await {
        tracing::error!("Exchange pipeline failed: {e}");
    }
    let reply = ctx.reply.take().unwrap_or_else(|| ComposedReply {
        text: templates::GLITCH_LINE.to_string(),
        action: None,
        category: Some("glitch".into()),
    });

    match reply.action {
        Some(ActionTag::PlayBeat) => announce_playback(player.try_play()),
        Some(ActionTag::GenerateLyrics) => {
            let sheet = composer.generate_lyrics(ctx.classification.genre.as_deref());
            println!("{sheet}");
        }
        Some(ActionTag::ShowTutorial) | None => {}
    }

    // Genre beats mood when both were detected in this exchange.
    let topic = ctx
        .classification
        .genre
        .clone()
        .or_else(|| ctx.classification.mood.clone());
    session.append(
        channel,
        Sender::System,
        &reply.text,
        reply.category.clone(),
        None,
    );
    session.complete_exchange(channel, topic, reply.action, &ctx.classification.keywords);

    println!("FLIPZ: {}", reply.text);
}

fn thinking_delay(rng: &dyn RandomSource, config: &GatewayConfig) -> u64 {
    if config.think_max_ms <= config.think_min_ms {
        return config.think_min_ms;
    }
    rng.range_u32(config.think_min_ms as u32, config.think_max_ms as u32) as u64
}

fn announce_playback(outcome: PlayOutcome) {
    match outcome {
        PlayOutcome::Started => println!("[player] beat rolling"),
        PlayOutcome::Rejected => {
            println!("[player] autoplay blocked, the beat starts after your next message")
        }
    }
}

pub struct GatewayCliPlugin {
    config: serde_json::Value,
}

impl GatewayCliPlugin {
    pub fn create() -> Box<dyn FlipzPlugin> {
        Box::new(Self {
            config: serde_json::Value::Null,
        })
    }
}

#[async_trait]
impl FlipzPlugin for GatewayCliPlugin {
    fn meta(&self) -> PluginMeta {
        PluginMeta {
            id: "gateway-cli".into(),
            name: "Gateway CLI Plugin".into(),
            version: "0.1.0".into(),
            dependencies: vec![
                PluginDependency {
                    plugin_id: "composer".into(),
                    version_req: "0.1".into(),
                    optional: false,
                },
                PluginDependency {
                    plugin_id: "session".into(),
                    version_req: "0.1".into(),
                    optional: false,
                },
                PluginDependency {
                    plugin_id: "metrics".into(),
                    version_req: "0.1".into(),
                    optional: true,
                },
            ],
            provides: vec!["gateway".into()],
            category: PluginCategory::Gateway,
        }
    }

    async fn load(&mut self, config: toml::Value) -> Result<()> {
        tracing::info!("GatewayCliPlugin loaded");
        self.config = serde_json::to_value(config.to_string())?;
        Ok(())
    }

    async fn init(&mut self) -> Result<()> {
        tracing::info!("GatewayCliPlugin initialized");
        Ok(())
    }

    async fn start(&mut self) -> Result<()> {
        tracing::info!("GatewayCliPlugin started");
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        tracing::info!("GatewayCliPlugin stopped");
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
        PluginHealth {
            status: HealthStatus::Healthy,
            message: "OK".into(),
            metrics: HashMap::new(),
        }
    }
}
