//! Voice activity detection using energy-based analysis.
//!
//! [`VadModel`] is the immutable detector loaded once per worker process and
//! shared across jobs. Each session owns a [`VadStream`] that turns a chunk
//! stream into complete speech segments.

use crate::config::VadConfig;
use crate::error::{AgentError, Result};
use crate::pipeline::messages::{AudioChunk, SpeechSegment};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Voice activity detector using RMS energy thresholding.
#[derive(Debug)]
pub struct VadModel {
    threshold: f32,
    min_silence_ms: u32,
    min_speech_ms: u32,
}

impl VadModel {
    /// Load the detector from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the threshold is outside (0, 1].
    pub fn load(config: &VadConfig) -> Result<Self> {
        if !(config.threshold > 0.0 && config.threshold <= 1.0) {
            return Err(AgentError::Vad(format!(
                "threshold must be in (0, 1], got {}",
                config.threshold
            )));
        }

        info!(
            "VAD loaded: threshold={}, min_silence={}ms, min_speech={}ms",
            config.threshold, config.min_silence_duration_ms, config.min_speech_duration_ms
        );

        Ok(Self {
            threshold: config.threshold,
            min_silence_ms: config.min_silence_duration_ms,
            min_speech_ms: config.min_speech_duration_ms,
        })
    }

    /// Whether a chunk of samples carries speech.
    pub fn is_speech(&self, samples: &[f32]) -> bool {
        compute_rms_energy(samples) > self.threshold
    }

    /// Start a per-session segmenter backed by this model.
    pub fn stream(self: &Arc<Self>) -> VadStream {
        VadStream {
            model: Arc::clone(self),
            speech_buffer: Vec::new(),
            in_speech: false,
            silence_samples: 0,
            speech_start: None,
        }
    }
}

/// Per-session speech segmenter.
pub struct VadStream {
    model: Arc<VadModel>,
    /// Accumulated samples for the current speech segment.
    speech_buffer: Vec<f32>,
    /// Whether we are currently in a speech segment.
    in_speech: bool,
    /// Trailing silence accumulated inside the current segment.
    silence_samples: usize,
    /// When the current speech segment started.
    speech_start: Option<Instant>,
}

impl VadStream {
    /// Process an audio chunk and return a speech segment if a complete
    /// utterance has been detected.
    pub fn process_chunk(&mut self, chunk: &AudioChunk) -> Option<SpeechSegment> {
        if chunk.samples.is_empty() || chunk.sample_rate == 0 {
            return None;
        }

        if self.model.is_speech(&chunk.samples) {
            if !self.in_speech {
                self.in_speech = true;
                self.speech_start = Some(chunk.captured_at);
                self.speech_buffer.clear();
            }
            self.silence_samples = 0;
            self.speech_buffer.extend_from_slice(&chunk.samples);
            return None;
        }

        if !self.in_speech {
            return None;
        }

        // Silence within tolerance stays in the segment.
        self.silence_samples += chunk.samples.len();
        self.speech_buffer.extend_from_slice(&chunk.samples);

        let min_silence = ms_to_samples(chunk.sample_rate, self.model.min_silence_ms);
        if self.silence_samples < min_silence {
            return None;
        }

        self.in_speech = false;
        let silence = std::mem::take(&mut self.silence_samples);
        let speech_len = self.speech_buffer.len().saturating_sub(silence);
        let min_speech = ms_to_samples(chunk.sample_rate, self.model.min_speech_ms);

        if speech_len < min_speech {
            debug!("dropping short speech burst ({speech_len} samples)");
            self.speech_buffer.clear();
            return None;
        }

        Some(SpeechSegment {
            samples: std::mem::take(&mut self.speech_buffer),
            sample_rate: chunk.sample_rate,
            started_at: self.speech_start.take().unwrap_or_else(Instant::now),
        })
    }

    /// Whether a speech segment is currently open.
    pub fn in_speech(&self) -> bool {
        self.in_speech
    }

    /// Reset the segmenter state.
    pub fn reset(&mut self) {
        self.speech_buffer.clear();
        self.in_speech = false;
        self.silence_samples = 0;
        self.speech_start = None;
    }
}

fn ms_to_samples(sample_rate: u32, ms: u32) -> usize {
    (sample_rate as usize * ms as usize) / 1000
}

/// Compute RMS energy of audio samples.
fn compute_rms_energy(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = samples.iter().map(|s| s * s).sum();
    (sum_sq / samples.len() as f32).sqrt()
}
