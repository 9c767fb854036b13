//! Message types passed between the room and the session stages.

use std::time::Instant;

/// A chunk of raw audio samples from the room.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    /// Mono f32 samples.
    pub samples: Vec<f32>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Timestamp when this chunk was received.
    pub captured_at: Instant,
}

impl AudioChunk {
    /// Wrap samples received now.
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
            captured_at: Instant::now(),
        }
    }
}

/// A complete speech segment detected by VAD, ready for STT.
#[derive(Debug, Clone)]
pub struct SpeechSegment {
    /// Concatenated audio samples for the entire utterance.
    pub samples: Vec<f32>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// When the speech segment started.
    pub started_at: Instant,
}

/// A transcription result from the STT engine.
#[derive(Debug, Clone)]
pub struct Transcription {
    /// The transcribed text.
    pub text: String,
    /// Time the original audio was captured.
    pub audio_captured_at: Instant,
    /// Time the transcription completed.
    pub transcribed_at: Instant,
}

/// Synthesized audio from TTS, ready to publish.
#[derive(Debug, Clone)]
pub struct SynthesizedAudio {
    /// f32 audio samples (empty for text-only synthesis).
    pub samples: Vec<f32>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// The text this audio speaks.
    pub text: String,
}

/// Inbound events delivered by a room.
#[derive(Debug, Clone)]
pub enum RoomEvent {
    /// Microphone audio from the participant.
    Audio(AudioChunk),
    /// Typed chat from the participant; bypasses VAD and STT.
    Text(String),
    /// The participant left or the transport closed.
    Disconnected,
}

/// Outbound payloads published to a room.
#[derive(Debug, Clone)]
pub enum RoomOutput {
    /// Text channel message.
    Text(String),
    /// Speech channel audio.
    Audio(SynthesizedAudio),
}
