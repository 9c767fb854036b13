//! Shared helpers for integration tests.

use async_trait::async_trait;
use aureon::config::{AgentConfig, VadConfig};
use aureon::llm::{ChatMessage, LanguageModel};
use aureon::pipeline::messages::{AudioChunk, RoomEvent, RoomOutput, SpeechSegment, Transcription};
use aureon::room::RoomPeer;
use aureon::stt::SpeechToText;
use aureon::tts::TextOnlyTts;
use aureon::{Providers, Result};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// One agent output as the participant sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Heard {
    Text(String),
    Speech(String),
}

/// Text then speech of the same line.
pub(crate) fn both(text: &str) -> Vec<Heard> {
    vec![Heard::Text(text.to_owned()), Heard::Speech(text.to_owned())]
}

/// Drain everything the agent published so far.
pub(crate) fn drain_outputs(peer: &mut RoomPeer) -> Vec<Heard> {
    let mut heard = Vec::new();
    while let Ok(output) = peer.outputs.try_recv() {
        heard.push(match output {
            RoomOutput::Text(text) => Heard::Text(text),
            RoomOutput::Audio(audio) => Heard::Speech(audio.text),
        });
    }
    heard
}

/// Default config with a VAD tuned for short synthetic utterances.
pub(crate) fn test_config() -> AgentConfig {
    let mut config = AgentConfig::default();
    config.vad = VadConfig {
        threshold: 0.01,
        min_silence_duration_ms: 64,
        min_speech_duration_ms: 32,
    };
    config
}

/// Queue one spoken utterance: loud chunks, then enough silence to close it.
pub(crate) async fn speak(peer: &RoomPeer) {
    let loud = std::iter::repeat_n(0.3_f32, 3);
    let quiet = std::iter::repeat_n(0.0_f32, 3);
    for level in loud.chain(quiet) {
        let samples = vec![level; 512];
        peer.events
            .send(RoomEvent::Audio(AudioChunk::new(samples, 16_000)))
            .await
            .expect("queue audio");
    }
}

/// Queue typed turns followed by a disconnect.
pub(crate) async fn type_then_leave(peer: &RoomPeer, turns: &[&str]) {
    for turn in turns {
        peer.events
            .send(RoomEvent::Text((*turn).to_owned()))
            .await
            .expect("queue text");
    }
    peer.events
        .send(RoomEvent::Disconnected)
        .await
        .expect("queue disconnect");
}

/// A recorded model call.
#[derive(Debug, Clone)]
pub(crate) struct LlmCall {
    pub system_prompt: String,
    pub history: Vec<ChatMessage>,
}

/// Language model replying from a script and recording every call.
pub(crate) struct ScriptedLlm {
    replies: Mutex<VecDeque<String>>,
    calls: Mutex<Vec<LlmCall>>,
}

impl ScriptedLlm {
    pub(crate) fn new(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().map(|r| (*r).to_owned()).collect()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn calls(&self) -> Vec<LlmCall> {
        self.calls.lock().expect("calls lock").clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedLlm {
    fn model(&self) -> &str {
        "scripted"
    }

    async fn chat(&self, system_prompt: &str, history: &[ChatMessage]) -> Result<String> {
        self.calls.lock().expect("calls lock").push(LlmCall {
            system_prompt: system_prompt.to_owned(),
            history: history.to_vec(),
        });
        let reply = self.replies.lock().expect("replies lock").pop_front();
        Ok(reply.unwrap_or_else(|| "The mist stirs.".to_owned()))
    }
}

/// STT returning the same transcript for every segment.
pub(crate) struct FixedStt(pub &'static str);

#[async_trait]
impl SpeechToText for FixedStt {
    fn model(&self) -> &str {
        "fixed"
    }

    async fn transcribe(&self, segment: &SpeechSegment) -> Result<Transcription> {
        Ok(Transcription {
            text: self.0.to_owned(),
            audio_captured_at: segment.started_at,
            transcribed_at: Instant::now(),
        })
    }
}

/// Providers with text-only speech and the given model.
pub(crate) fn providers(config: &AgentConfig, llm: Arc<dyn LanguageModel>) -> Providers {
    Providers::new(llm, Arc::new(TextOnlyTts::new(&config.tts)))
}
