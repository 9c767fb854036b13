//! End-of-turn detection.
//!
//! VAD closes a segment on silence, but a pause is not always the end of a
//! turn ("I open the door... and step inside"). A [`TurnDetector`] scores a
//! transcript; below the configured threshold the session holds the text
//! and joins it with the next segment.

use crate::error::Result;
use crate::llm::ChatContext;
use async_trait::async_trait;

/// Scores how likely a transcript ends the user's turn.
#[async_trait]
pub trait TurnDetector: Send + Sync {
    /// Detector name (for logs).
    fn name(&self) -> &str;

    /// Probability in `[0, 1]` that `transcript` completes the user's turn.
    async fn end_of_turn_probability(&self, chat: &ChatContext, transcript: &str) -> Result<f32>;
}

/// Treats every VAD segment as a finished turn.
#[derive(Debug, Clone, Copy, Default)]
pub struct VadTurnDetector;

#[async_trait]
impl TurnDetector for VadTurnDetector {
    fn name(&self) -> &str {
        "vad"
    }

    async fn end_of_turn_probability(&self, _chat: &ChatContext, _transcript: &str) -> Result<f32> {
        Ok(1.0)
    }
}

/// Join a held partial turn with the next transcript.
pub(crate) fn join_turn_text(held: &str, next: &str) -> String {
    let held = held.trim();
    let next = next.trim();
    match (held.is_empty(), next.is_empty()) {
        (true, _) => next.to_owned(),
        (false, true) => held.to_owned(),
        (false, false) => format!("{held} {next}"),
    }
}
