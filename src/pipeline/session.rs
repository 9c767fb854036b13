//! Agent session: wires STT, LLM, TTS, VAD and turn detection to a room and
//! drives the game-master gate turn by turn.

use crate::agent::{
    GameMasterAgent, INTRO, ResponseOutcome, SessionOutput, UtteranceOutcome, close_narration,
};
use crate::config::{AgentConfig, TurnDetectionMode};
use crate::error::{AgentError, Result};
use crate::llm::{ChatContext, LanguageModel};
use crate::pipeline::messages::{AudioChunk, RoomEvent, SpeechSegment};
use crate::room::{Room, RoomInputOptions};
use crate::stt::SpeechToText;
use crate::tts::TextToSpeech;
use crate::turn::{TurnDetector, VadTurnDetector, join_turn_text};
use crate::vad::{VadModel, VadStream};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Provider handles for one conversation.
pub struct AgentSession {
    config: Arc<AgentConfig>,
    stt: Option<Arc<dyn SpeechToText>>,
    llm: Arc<dyn LanguageModel>,
    tts: Arc<dyn TextToSpeech>,
    vad: Arc<VadModel>,
    turn_detector: Arc<dyn TurnDetector>,
}

/// Builder for [`AgentSession`].
pub struct AgentSessionBuilder {
    config: Arc<AgentConfig>,
    stt: Option<Arc<dyn SpeechToText>>,
    llm: Option<Arc<dyn LanguageModel>>,
    tts: Option<Arc<dyn TextToSpeech>>,
    vad: Option<Arc<VadModel>>,
    turn_detector: Option<Arc<dyn TurnDetector>>,
}

impl AgentSessionBuilder {
    /// Speech-to-text engine. Without one, room audio is ignored and only
    /// typed text reaches the agent.
    pub fn stt(mut self, stt: Arc<dyn SpeechToText>) -> Self {
        self.stt = Some(stt);
        self
    }

    pub fn llm(mut self, llm: Arc<dyn LanguageModel>) -> Self {
        self.llm = Some(llm);
        self
    }

    pub fn tts(mut self, tts: Arc<dyn TextToSpeech>) -> Self {
        self.tts = Some(tts);
        self
    }

    /// The prewarmed VAD model shared by the worker.
    pub fn vad(mut self, vad: Arc<VadModel>) -> Self {
        self.vad = Some(vad);
        self
    }

    pub fn turn_detector(mut self, detector: Arc<dyn TurnDetector>) -> Self {
        self.turn_detector = Some(detector);
        self
    }

    /// Finish the session.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Config`] if the LLM, TTS or VAD handle is missing.
    pub fn build(self) -> Result<AgentSession> {
        let llm = self
            .llm
            .ok_or_else(|| AgentError::Config("session requires a language model".into()))?;
        let tts = self
            .tts
            .ok_or_else(|| AgentError::Config("session requires a text-to-speech engine".into()))?;
        let vad = self
            .vad
            .ok_or_else(|| AgentError::Config("session requires a VAD model".into()))?;

        let turn_detector = match self.turn_detector {
            Some(detector) => detector,
            None => {
                if self.config.turn_detection.mode == TurnDetectionMode::Multilingual {
                    warn!("multilingual turn detection requested but no detector supplied, using VAD turns");
                }
                Arc::new(VadTurnDetector)
            }
        };

        Ok(AgentSession {
            config: self.config,
            stt: self.stt,
            llm,
            tts,
            vad,
            turn_detector,
        })
    }
}

/// Counters reported when a session ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    /// Non-empty user turns handed to the gate.
    pub user_turns: usize,
    /// Model invocations.
    pub model_calls: usize,
    /// Whether the story had started by the end.
    pub story_started: bool,
}

/// Running session task.
pub struct SessionHandle {
    task: JoinHandle<Result<SessionSummary>>,
    cancel: CancellationToken,
}

impl SessionHandle {
    /// Ask the session to stop after the current turn.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait until the room disconnects or the session is cancelled.
    ///
    /// # Errors
    ///
    /// Returns the error that ended the session, or [`AgentError::Session`]
    /// if the task panicked.
    pub async fn wait(self) -> Result<SessionSummary> {
        self.task
            .await
            .map_err(|e| AgentError::Session(format!("session task failed: {e}")))?
    }
}

impl AgentSession {
    pub fn builder(config: Arc<AgentConfig>) -> AgentSessionBuilder {
        AgentSessionBuilder {
            config,
            stt: None,
            llm: None,
            tts: None,
            vad: None,
            turn_detector: None,
        }
    }

    /// Configure the room input, deliver the welcome, then run turns on a
    /// spawned task until the room closes or `cancel` fires.
    ///
    /// # Errors
    ///
    /// Returns an error if the room rejects the input options or the welcome
    /// cannot be delivered.
    pub async fn start(
        self,
        agent: GameMasterAgent,
        room: Arc<dyn Room>,
        options: RoomInputOptions,
        cancel: CancellationToken,
    ) -> Result<SessionHandle> {
        room.configure_input(&options)?;

        info!(
            room = %room.name(),
            stt = self.stt.as_ref().map(|s| s.model()).unwrap_or("none"),
            llm = %self.llm.model(),
            tts = %self.tts.voice(),
            turn_detection = %self.turn_detector.name(),
            noise_cancellation = ?options.noise_cancellation,
            "starting agent session"
        );

        let io = SessionIo {
            room: Arc::clone(&room),
            tts: Arc::clone(&self.tts),
        };
        agent.on_session_start(&io).await?;

        let runner = SessionRunner {
            vad: self.vad.stream(),
            chat: ChatContext::new(self.config.llm.max_history_messages),
            end_of_turn_threshold: self.config.turn_detection.end_of_turn_threshold,
            agent,
            io,
            room,
            stt: self.stt,
            llm: self.llm,
            turn_detector: self.turn_detector,
            held_turn: String::new(),
            summary: SessionSummary::default(),
            warned_no_stt: false,
        };

        let task = tokio::spawn(runner.run(cancel.clone()));
        Ok(SessionHandle { task, cancel })
    }
}

/// The session's text and speech channels.
struct SessionIo {
    room: Arc<dyn Room>,
    tts: Arc<dyn TextToSpeech>,
}

#[async_trait]
impl SessionOutput for SessionIo {
    async fn send_text(&self, text: &str) -> Result<()> {
        self.room.publish_text(text).await
    }

    async fn say(&self, text: &str) -> Result<()> {
        let audio = self.tts.synthesize(text).await?;
        self.room.publish_audio(audio).await
    }
}

struct SessionRunner {
    agent: GameMasterAgent,
    io: SessionIo,
    room: Arc<dyn Room>,
    stt: Option<Arc<dyn SpeechToText>>,
    llm: Arc<dyn LanguageModel>,
    turn_detector: Arc<dyn TurnDetector>,
    end_of_turn_threshold: f32,
    vad: VadStream,
    chat: ChatContext,
    /// Transcript of a turn the detector judged unfinished.
    held_turn: String,
    summary: SessionSummary,
    warned_no_stt: bool,
}

impl SessionRunner {
    async fn run(mut self, cancel: CancellationToken) -> Result<SessionSummary> {
        loop {
            let event = tokio::select! {
                () = cancel.cancelled() => {
                    info!("session cancelled");
                    break;
                }
                event = self.room.next_event() => event,
            };

            let result = match event {
                Some(RoomEvent::Text(text)) => {
                    if self.vad.in_speech() {
                        debug!("typed turn supersedes open speech segment");
                        self.vad.reset();
                    }
                    let held = std::mem::take(&mut self.held_turn);
                    self.complete_turn(&join_turn_text(&held, &text)).await
                }
                Some(RoomEvent::Audio(chunk)) => self.handle_audio(&chunk).await,
                Some(RoomEvent::Disconnected) | None => {
                    info!(room = %self.room.name(), "room disconnected");
                    break;
                }
            };
            absorb_turn_error(result)?;
        }

        if !self.held_turn.is_empty() {
            debug!("dropping unfinished turn: \"{}\"", self.held_turn);
        }
        if !self.chat.is_empty() {
            debug!(history_messages = self.chat.len(), "discarding chat history");
        }
        self.summary.story_started = self.agent.story_started();
        info!(
            user_turns = self.summary.user_turns,
            model_calls = self.summary.model_calls,
            story_started = self.summary.story_started,
            "session ended"
        );
        Ok(self.summary)
    }

    async fn handle_audio(&mut self, chunk: &AudioChunk) -> Result<()> {
        let Some(stt) = self.stt.clone() else {
            if !self.warned_no_stt {
                warn!("room audio received but no speech-to-text engine is configured, ignoring");
                self.warned_no_stt = true;
            }
            return Ok(());
        };

        match self.vad.process_chunk(chunk) {
            Some(segment) => self.handle_segment(stt.as_ref(), &segment).await,
            None => Ok(()),
        }
    }

    async fn handle_segment(&mut self, stt: &dyn SpeechToText, segment: &SpeechSegment) -> Result<()> {
        let t = stt.transcribe(segment).await?;
        let latency = t.transcribed_at.duration_since(t.audio_captured_at);
        debug!("transcribed in {:.0}ms: \"{}\"", latency.as_millis(), t.text);

        if t.text.trim().is_empty() {
            return Ok(());
        }

        let candidate = join_turn_text(&self.held_turn, &t.text);
        let probability = self
            .turn_detector
            .end_of_turn_probability(&self.chat, &candidate)
            .await?;

        if probability >= self.end_of_turn_threshold {
            self.held_turn.clear();
            self.complete_turn(&candidate).await
        } else {
            debug!("turn not finished (p={probability:.2}), holding \"{candidate}\"");
            self.held_turn = candidate;
            Ok(())
        }
    }

    async fn complete_turn(&mut self, text: &str) -> Result<()> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(());
        }
        self.summary.user_turns += 1;
        info!("user turn: \"{text}\"");

        let was_started = self.agent.story_started();
        let outcome = self.agent.on_user_utterance(text, &self.io).await;
        if !was_started && self.agent.story_started() {
            // Recorded even if speaking the intro failed.
            self.chat.push_assistant(INTRO);
        }

        match outcome? {
            UtteranceOutcome::Deferred => self.respond(text).await,
            UtteranceOutcome::Started | UtteranceOutcome::Nudged => Ok(()),
        }
    }

    async fn respond(&mut self, text: &str) -> Result<()> {
        self.chat.push_user(text);
        self.summary.model_calls += 1;

        let reply = self
            .llm
            .chat(self.agent.instructions(), self.chat.messages())
            .await?;

        // Recorded before emitting; a failed `say` must not drop it.
        if self.agent.story_started() {
            self.chat.push_assistant(close_narration(&reply));
        }
        if self.agent.on_model_response(&reply, &self.io).await? == ResponseOutcome::Suppressed {
            debug!("model reply suppressed");
        }
        Ok(())
    }
}

/// Provider failures cost one turn; a broken room ends the session.
fn absorb_turn_error(result: Result<()>) -> Result<()> {
    match result {
        Ok(()) => Ok(()),
        Err(e @ (AgentError::Room(_) | AgentError::Channel(_))) => Err(e),
        Err(e) => {
            warn!("turn failed: {e}");
            Ok(())
        }
    }
}
