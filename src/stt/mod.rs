//! Speech-to-text provider seam.
//!
//! Streaming ASR lives with the voice runtime that hosts the session; the
//! session only needs a finished transcript for each VAD speech segment.

use crate::error::Result;
use crate::pipeline::messages::{SpeechSegment, Transcription};
use async_trait::async_trait;

/// A speech-to-text engine the session hands speech segments to.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Provider model identifier (for logs).
    fn model(&self) -> &str;

    /// Transcribe a complete speech segment.
    async fn transcribe(&self, segment: &SpeechSegment) -> Result<Transcription>;
}
