//! Room transport seam.
//!
//! A room is the connected communication channel of one job: participant
//! audio and typed text come in as [`RoomEvent`]s, agent text and speech go
//! out. The real-time transport belongs to whatever runtime hosts the worker;
//! this crate ships an in-process [`ChannelRoom`] and a stdin/stdout
//! [`ConsoleRoom`].

pub mod channel;
pub mod console;

pub use channel::{ChannelRoom, RoomPeer};
pub use console::ConsoleRoom;

use crate::config::{NoiseCancellation, RoomConfig};
use crate::error::Result;
use crate::pipeline::messages::{RoomEvent, SynthesizedAudio};
use async_trait::async_trait;

/// Options applied to the room's inbound audio when a session starts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoomInputOptions {
    pub noise_cancellation: NoiseCancellation,
}

impl From<&RoomConfig> for RoomInputOptions {
    fn from(config: &RoomConfig) -> Self {
        Self {
            noise_cancellation: config.noise_cancellation,
        }
    }
}

/// A connected communication room.
#[async_trait]
pub trait Room: Send + Sync {
    /// Room name (for logs).
    fn name(&self) -> &str;

    /// Join the room. Called once per job before the session starts.
    async fn connect(&self) -> Result<()>;

    /// Apply input processing options. Rooms without audio ignore them.
    fn configure_input(&self, _options: &RoomInputOptions) -> Result<()> {
        Ok(())
    }

    /// Next inbound event, or `None` once the room is closed.
    async fn next_event(&self) -> Option<RoomEvent>;

    /// Publish a text channel message.
    async fn publish_text(&self, text: &str) -> Result<()>;

    /// Publish speech channel audio.
    async fn publish_audio(&self, audio: SynthesizedAudio) -> Result<()>;
}
