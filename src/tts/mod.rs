//! Text-to-speech provider seam.
//!
//! The session speaks every agent-authored line through a [`TextToSpeech`]
//! engine and publishes the result on the room's speech channel.

use crate::config::TtsConfig;
use crate::error::Result;
use crate::pipeline::messages::SynthesizedAudio;
use async_trait::async_trait;
use tracing::debug;

/// A speech synthesis engine.
#[async_trait]
pub trait TextToSpeech: Send + Sync {
    /// Voice identifier (for logs).
    fn voice(&self) -> &str;

    /// Synthesize `text` into audio.
    async fn synthesize(&self, text: &str) -> Result<SynthesizedAudio>;
}

/// Synthesizer for text-only rooms: carries the text, produces no samples.
#[derive(Debug, Clone)]
pub struct TextOnlyTts {
    voice: String,
    sample_rate: u32,
}

impl TextOnlyTts {
    /// Create from the configured voice selection.
    pub fn new(config: &TtsConfig) -> Self {
        Self {
            voice: config.voice.clone(),
            sample_rate: config.sample_rate,
        }
    }
}

#[async_trait]
impl TextToSpeech for TextOnlyTts {
    fn voice(&self) -> &str {
        &self.voice
    }

    async fn synthesize(&self, text: &str) -> Result<SynthesizedAudio> {
        debug!(voice = %self.voice, chars = text.len(), "text-only synthesis");
        Ok(SynthesizedAudio {
            samples: Vec::new(),
            sample_rate: self.sample_rate,
            text: text.to_owned(),
        })
    }
}
