use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use flipz_core::{
    ActionTag, ClassificationContext, ComposeContext, ComposedReply, ConversationState,
    FlipzError, FlipzPlugin, HealthStatus, PluginCategory, PluginDependency, PluginHealth,
    PluginMeta, RandomSource, Result,
};

pub mod templates;

/// `{name}` substitution over a template string. A placeholder left
/// unresolved after substitution is a hard error so malformed templates
/// surface instead of leaking braces to the user.
pub fn interpolate(template: &str, vars: &[(&str, String)]) -> Result<String> {
    let mut out = template.to_string();
    for (name, value) in vars {
        out = out.replace(&format!("{{{name}}}"), value);
    }
    if out.contains('{') && out.contains('}') {
        let tail: String = out[out.find('{').unwrap_or(0)..].chars().take(16).collect();
        return Err(FlipzError::TemplateError(format!(
            "unresolved placeholder near '{tail}'"
        )));
    }
    Ok(out)
}

pub struct ComposerService {
    rng: Arc<dyn RandomSource>,
}

impl ComposerService {
    pub fn new(rng: Arc<dyn RandomSource>) -> Self {
        Self { rng }
    }

    /// Priority routing: beat, then lyrics, then help, then the composite
    /// fallback. Interpolation failures bubble up; the caller decides how
    /// to degrade (the gateway swaps in the glitch line).
    pub fn compose(
        &self,
        input: &str,
        classification: &ClassificationContext,
        state: &ConversationState,
    ) -> Result<ComposedReply> {
        let lower = input.to_lowercase();
        tracing::debug!(depth = state.depth, "Composing reply");

        if templates::BEAT_KEYWORDS.iter().any(|k| lower.contains(k)) {
            let text = self.beat_line(classification.genre.as_deref())?;
            return Ok(ComposedReply {
                text,
                action: Some(ActionTag::PlayBeat),
                category: Some("beat".into()),
            });
        }

        if templates::LYRIC_KEYWORDS.iter().any(|k| lower.contains(k)) {
            let template = self
                .rng
                .pick(templates::LYRIC_TEMPLATES)
                .unwrap_or(templates::LYRIC_TEMPLATES[0]);
            let genre = classification
                .genre
                .as_deref()
                .unwrap_or(templates::DEFAULT_GENRE);
            let mut text = interpolate(template, &[("genre", genre.to_string())])?;
            // A detected mood still colors the lyric reply.
            if let Some(line) = classification.mood.as_deref().and_then(mood_line) {
                text.push(' ');
                text.push_str(line);
            }
            return Ok(ComposedReply {
                text,
                action: Some(ActionTag::GenerateLyrics),
                category: Some("lyrics".into()),
            });
        }

        if templates::HELP_KEYWORDS.iter().any(|k| lower.contains(k)) {
            return Ok(ComposedReply {
                text: templates::TUTORIAL_PROMPT.to_string(),
                action: Some(ActionTag::ShowTutorial),
                category: Some("tutorial".into()),
            });
        }

        // Composite fallback: opener, then genre and mood lines when
        // detected, then a process question. Empty parts are dropped so
        // the join never doubles a space.
        let mut parts: Vec<&str> = Vec::new();
        let opener = self
            .rng
            .pick(templates::SLANG_OPENERS)
            .unwrap_or(templates::SLANG_OPENERS[0]);
        parts.push(opener);
        if let Some(line) = classification.genre.as_deref().and_then(genre_line) {
            parts.push(line);
        }
        if let Some(line) = classification.mood.as_deref().and_then(mood_line) {
            parts.push(line);
        }
        let question = self
            .rng
            .pick(templates::PROCESS_QUESTIONS)
            .unwrap_or(templates::PROCESS_QUESTIONS[0]);
        parts.push(question);

        Ok(ComposedReply {
            text: parts.join(" "),
            action: None,
            category: None,
        })
    }

    /// One beat announcement line: random template, tempo in [120, 160),
    /// random effect. Shared by the chat route and the /play command.
    pub fn beat_line(&self, genre: Option<&str>) -> Result<String> {
        let template = self
            .rng
            .pick(templates::BEAT_TEMPLATES)
            .unwrap_or(templates::BEAT_TEMPLATES[0]);
        let genre = genre.unwrap_or(templates::DEFAULT_GENRE);
        let bpm = self.rng.range_u32(120, 160);
        let effect = self.rng.pick(templates::EFFECTS).unwrap_or(templates::EFFECTS[0]);
        interpolate(
            template,
            &[
                ("genre", genre.to_string()),
                ("bpm", bpm.to_string()),
                ("effect", effect.to_string()),
            ],
        )
    }

    /// Lyric sheet for /generate and the generate_lyrics action: hook,
    /// two verse lines, outro, all pulled from the line pools.
    pub fn generate_lyrics(&self, genre: Option<&str>) -> String {
        let genre = genre.unwrap_or(templates::DEFAULT_GENRE);
        let hook = self
            .rng
            .pick(templates::LYRIC_HOOKS)
            .unwrap_or(templates::LYRIC_HOOKS[0]);
        let verse_a = self
            .rng
            .pick(templates::LYRIC_VERSES)
            .unwrap_or(templates::LYRIC_VERSES[0]);
        let verse_b = self
            .rng
            .pick(templates::LYRIC_VERSES)
            .unwrap_or(templates::LYRIC_VERSES[1]);
        let outro = self
            .rng
            .pick(templates::LYRIC_OUTROS)
            .unwrap_or(templates::LYRIC_OUTROS[0]);
        format!("[Hook]\n{hook}\n\n[Verse]\n{verse_a}\n{verse_b}\n\n[Outro]\n{outro}")
            .replace("{genre}", genre)
    }
}

fn genre_line(genre: &str) -> Option<&'static str> {
    templates::GENRE_LINES
        .iter()
        .find(|(g, _)| *g == genre)
        .map(|(_, line)| *line)
}

fn mood_line(mood: &str) -> Option<&'static str> {
    templates::MOOD_LINES
        .iter()
        .find(|(m, _)| *m == mood)
        .map(|(_, line)| *line)
}

pub struct ComposerPlugin {
    config: serde_json::Value,
    service: Arc<ComposerService>,
}

impl ComposerPlugin {
    pub fn create(service: Arc<ComposerService>) -> Box<dyn FlipzPlugin> {
        Box::new(Self {
            config: serde_json::Value::Null,
            service,
        })
    }
}

#[async_trait]
impl FlipzPlugin for ComposerPlugin {
    fn meta(&self) -> PluginMeta {
        PluginMeta {
            id: "composer".into(),
            name: "Composer Plugin".into(),
            version: "0.1.0".into(),
            dependencies: vec![PluginDependency {
                plugin_id: "classifier".into(),
                version_req: "0.1".into(),
                optional: false,
            }],
            provides: vec!["compose".into()],
            category: PluginCategory::Composer,
        }
    }

    async fn load(&mut self, config: toml::Value) -> Result<()> {
        tracing::info!("ComposerPlugin loaded");
        self.config = serde_json::to_value(config.to_string())?;
        Ok(())
    }

    async fn init(&mut self) -> Result<()> {
        tracing::info!("ComposerPlugin initialized");
        Ok(())
    }

    async fn start(&mut self) -> Result<()> {
        tracing::info!("ComposerPlugin started");
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        tracing::info!("ComposerPlugin stopped");
        Ok(())
    }

    async fn on_message(&self, _ctx: &mut ComposeContext) -> Result<()> {
        Ok(())
    }

    async fn compose(&self, ctx: &mut ComposeContext) -> Result<()> {
        match self
            .service
            .compose(&ctx.incoming.content, &ctx.classification, &ctx.state)
        {
            Ok(reply) => ctx.reply = Some(reply),
            Err(e) => {
                // Template trouble never kills the conversation; the user
                // gets the glitch line and we move on.
                tracing::warn!("Compose failed, substituting glitch line: {e}");
                ctx.reply = Some(ComposedReply {
                    text: templates::GLITCH_LINE.to_string(),
                    action: None,
                    category: Some("glitch".into()),
                });
            }
        }
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
            "beat_templates".into(),
            serde_json::json!(templates::BEAT_TEMPLATES.len()),
        );
        metrics.insert(
            "lyric_templates".into(),
            serde_json::json!(templates::LYRIC_TEMPLATES.len()),
        );
        metrics.insert(
            "openers".into(),
            serde_json::json!(templates::SLANG_OPENERS.len()),
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
    use flipz_core::ScriptedSource;
    use flipz_plugin_classifier::classify;

    use super::*;

    fn service() -> ComposerService {
        ComposerService::new(Arc::new(flipz_core::ThreadRngSource))
    }

    fn scripted(picks: Vec<usize>, numbers: Vec<f64>) -> ComposerService {
        ComposerService::new(Arc::new(ScriptedSource::new(picks, numbers)))
    }

    fn extract_bpm(text: &str) -> Option<u32> {
        text.split_whitespace()
            .filter_map(|t| t.trim_matches(|c: char| !c.is_ascii_digit()).parse().ok())
            .next()
    }

    #[test]
    fn beat_keyword_routes_to_play_beat() {
        let composer = service();
        let classification = classify("make me a beat");
        for _ in 0..50 {
            let reply = composer
                .compose("make me a beat", &classification, &ConversationState::default())
                .unwrap();
            assert_eq!(reply.action, Some(ActionTag::PlayBeat));
            let bpm = extract_bpm(&reply.text).expect("beat reply carries a tempo");
            assert!((120..160).contains(&bpm), "bpm {bpm} out of range");
        }
    }

    #[test]
    fn beat_reply_interpolates_detected_genre() {
        let composer = service();
        let classification = classify("yo can you make a trap beat");
        let reply = composer
            .compose(
                "yo can you make a trap beat",
                &classification,
                &ConversationState::default(),
            )
            .unwrap();
        assert!(reply.text.contains("trap"));
        assert!(extract_bpm(&reply.text).is_some());
    }

    #[test]
    fn lyric_keyword_routes_to_generate_lyrics() {
        let composer = service();
        let classification = classify("write me a verse");
        let reply = composer
            .compose("write me a verse", &classification, &ConversationState::default())
            .unwrap();
        assert_eq!(reply.action, Some(ActionTag::GenerateLyrics));
        // No genre detected, so the default fills the template.
        assert!(reply.text.contains(templates::DEFAULT_GENRE));
    }

    #[test]
    fn dark_lyric_request_carries_the_mood_line() {
        let composer = service();
        let classification = classify("write me something dark");
        let reply = composer
            .compose(
                "write me something dark",
                &classification,
                &ConversationState::default(),
            )
            .unwrap();
        assert_eq!(reply.action, Some(ActionTag::GenerateLyrics));
        assert!(reply.text.contains("dark"));
    }

    #[test]
    fn help_keyword_routes_to_tutorial() {
        let composer = service();
        let classification = classify("help me out");
        let reply = composer
            .compose("help me out", &classification, &ConversationState::default())
            .unwrap();
        assert_eq!(reply.action, Some(ActionTag::ShowTutorial));
        assert_eq!(reply.text, templates::TUTORIAL_PROMPT);
    }

    #[test]
    fn fallback_without_detections_is_opener_plus_question() {
        let composer = scripted(vec![0, 0], vec![]);
        let classification = classify("hmm okay then");
        let reply = composer
            .compose("hmm okay then", &classification, &ConversationState::default())
            .unwrap();
        assert!(reply.action.is_none());
        let expected = format!(
            "{} {}",
            templates::SLANG_OPENERS[0],
            templates::PROCESS_QUESTIONS[0]
        );
        assert_eq!(reply.text, expected);
        assert!(!reply.text.is_empty());
        assert!(!reply.text.contains("  "));
    }

    #[test]
    fn fallback_parts_come_from_the_candidate_pools() {
        let composer = service();
        let classification = classify("hmm okay then");
        let reply = composer
            .compose("hmm okay then", &classification, &ConversationState::default())
            .unwrap();
        assert!(templates::SLANG_OPENERS
            .iter()
            .any(|o| reply.text.starts_with(o)));
        assert!(templates::PROCESS_QUESTIONS
            .iter()
            .any(|q| reply.text.ends_with(q)));
    }

    #[test]
    fn fallback_includes_genre_and_mood_lines_when_detected() {
        let composer = scripted(vec![0, 0], vec![]);
        let classification = classify("going for chill lofi today");
        let reply = composer
            .compose(
                "going for chill lofi today",
                &classification,
                &ConversationState::default(),
            )
            .unwrap();
        assert!(reply.text.contains("lofi"));
        assert!(reply.text.contains("low key"));
    }

    #[test]
    fn scripted_beat_line_is_fully_deterministic() {
        let composer = scripted(vec![0, 0], vec![140.0]);
        let text = composer.beat_line(Some("drill")).unwrap();
        assert_eq!(
            text,
            "Cooking a drill beat at 140 BPM with reverb drowning the tail."
        );
    }

    #[test]
    fn unresolved_placeholder_is_a_template_error() {
        let result = interpolate("still has a {ghost} in it", &[("genre", "trap".into())]);
        assert!(matches!(result, Err(FlipzError::TemplateError(_))));
    }

    #[test]
    fn lyric_sheet_has_hook_verse_and_outro_sections() {
        let composer = service();
        let sheet = composer.generate_lyrics(Some("phonk"));
        assert!(sheet.contains("[Hook]"));
        assert!(sheet.contains("[Verse]"));
        assert!(sheet.contains("[Outro]"));
        assert!(!sheet.contains("{genre}"));
    }

    #[tokio::test]
    async fn plugin_hook_fills_the_reply() {
        let service = Arc::new(scripted(vec![0, 0], vec![133.0]));
        let plugin = ComposerPlugin::create(service);
        let mut ctx = ComposeContext::new(
            flipz_core::IncomingMessage {
                source: "test".into(),
                channel_id: "cli".into(),
                author: "user".into(),
                content: "make me a beat".into(),
                metadata: Default::default(),
            },
            ConversationState::default(),
        );
        ctx.classification = classify("make me a beat");
        plugin.compose(&mut ctx).await.unwrap();
        let reply = ctx.reply.expect("reply filled");
        assert_eq!(reply.action, Some(ActionTag::PlayBeat));
        assert!(reply.text.contains("133"));
    }
}
