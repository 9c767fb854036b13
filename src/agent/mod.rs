//! The game-master dialogue gate.
//!
//! Before the story starts, the agent speaks only scripted lines: a welcome
//! on session start, the opening narration once the player greets it, and a
//! nudge for anything else. After the story starts, user turns go to the
//! model and every model reply is closed with [`CLOSER`].

use crate::config::LlmConfig;
use crate::error::Result;
use async_trait::async_trait;
use tracing::info;

/// Trailing phrase every narrated reply ends with.
pub const CLOSER: &str = "\u{2026}What do you do next?";

/// Spoken and sent when the session starts.
pub const WELCOME: &str = "Greetings, traveler. I am Aureon, the voice of Eldoria. \
Whenever you're ready, speak\u{2026} and your adventure shall begin.";

/// Opening narration emitted when the player starts the story.
pub const INTRO: &str = "A cold breath of wind brushes your cheek as you awaken beneath \
towering whisperwood trees. A glowing rune stone beside you pulses with faint blue light, \
like a quiet heartbeat. Mist curls around your boots, and somewhere deeper in the forest\u{2026} \
a creature howls. Your journey begins now. \u{2026}What do you do next?";

/// Text-channel nudge for utterances that do not start the story.
pub const NUDGE_TEXT: &str = "Whenever you are ready\u{2026} simply say 'start'.";

/// Speech-channel nudge; the quotes would be read aloud awkwardly.
pub const NUDGE_SPEECH: &str = "Whenever you are ready\u{2026} simply say start.";

/// Normalized utterances that start the story. Exact match only.
pub const GREETING_TOKENS: &[&str] = &[
    "hi",
    "hello",
    "hey",
    "start",
    "begin",
    "let's start",
    "ready",
];

/// The text and speech channels of a running session.
#[async_trait]
pub trait SessionOutput: Send + Sync {
    /// Publish `text` on the text channel.
    async fn send_text(&self, text: &str) -> Result<()>;

    /// Synthesize and publish `text` on the speech channel.
    async fn say(&self, text: &str) -> Result<()>;
}

/// Story progress. `Started` is terminal.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum StoryState {
    #[default]
    NotStarted,
    Started,
}

/// What the gate did with a user utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UtteranceOutcome {
    /// A greeting started the story; the intro was emitted.
    Started,
    /// No greeting; the nudge was emitted.
    Nudged,
    /// The story is running; the model should answer.
    Deferred,
}

/// What the gate did with a model reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseOutcome {
    /// The reply was emitted with this normalized text.
    Narrated(String),
    /// The story has not started; nothing was emitted.
    Suppressed,
}

/// Scripted game master holding the story state and system prompt.
#[derive(Debug, Clone)]
pub struct GameMasterAgent {
    instructions: String,
    state: StoryState,
}

impl GameMasterAgent {
    /// Create an agent whose instructions are the assembled system prompt.
    pub fn new(config: &LlmConfig) -> Self {
        Self::with_instructions(config.effective_system_prompt())
    }

    pub fn with_instructions(instructions: impl Into<String>) -> Self {
        Self {
            instructions: instructions.into(),
            state: StoryState::NotStarted,
        }
    }

    /// The system prompt handed to the model.
    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    pub fn state(&self) -> StoryState {
        self.state
    }

    pub fn story_started(&self) -> bool {
        self.state == StoryState::Started
    }

    /// Send and speak the welcome line. Does not read or change the story state.
    ///
    /// # Errors
    ///
    /// Propagates output channel failures.
    pub async fn on_session_start(&self, out: &dyn SessionOutput) -> Result<()> {
        emit(out, WELCOME).await
    }

    /// Route a finished user turn.
    ///
    /// # Errors
    ///
    /// Propagates output channel failures. The state transition happens
    /// before the intro is emitted, so a failed emit still leaves the story
    /// started.
    pub async fn on_user_utterance(
        &mut self,
        text: &str,
        out: &dyn SessionOutput,
    ) -> Result<UtteranceOutcome> {
        if self.story_started() {
            return Ok(UtteranceOutcome::Deferred);
        }

        if is_greeting(text) {
            self.state = StoryState::Started;
            info!("story started");
            emit(out, INTRO).await?;
            return Ok(UtteranceOutcome::Started);
        }

        out.send_text(NUDGE_TEXT).await?;
        out.say(NUDGE_SPEECH).await?;
        Ok(UtteranceOutcome::Nudged)
    }

    /// Close and emit a model reply, or drop it before the story starts.
    ///
    /// # Errors
    ///
    /// Propagates output channel failures.
    pub async fn on_model_response(
        &self,
        text: &str,
        out: &dyn SessionOutput,
    ) -> Result<ResponseOutcome> {
        if !self.story_started() {
            info!("suppressing model reply before story start");
            return Ok(ResponseOutcome::Suppressed);
        }

        let narrated = close_narration(text);
        emit(out, &narrated).await?;
        Ok(ResponseOutcome::Narrated(narrated))
    }
}

/// Whether a raw utterance (any case, surrounding whitespace) is a greeting.
pub fn is_greeting(text: &str) -> bool {
    let normalized = text.trim().to_lowercase();
    GREETING_TOKENS.contains(&normalized.as_str())
}

/// Trim `text` and append [`CLOSER`] after a blank line unless already present.
pub fn close_narration(text: &str) -> String {
    let cleaned = text.trim();
    if cleaned.ends_with(CLOSER) {
        cleaned.to_owned()
    } else {
        format!("{cleaned}\n\n{CLOSER}")
    }
}

async fn emit(out: &dyn SessionOutput, text: &str) -> Result<()> {
    out.send_text(text).await?;
    out.say(text).await
}
