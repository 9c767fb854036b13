//! In-process room backed by tokio channels.
//!
//! The [`RoomPeer`] half plays the participant: it injects [`RoomEvent`]s and
//! receives everything the agent publishes. Used to bridge a foreign
//! transport into a session, and by the tests.

use crate::error::{AgentError, Result};
use crate::pipeline::messages::{RoomEvent, RoomOutput, SynthesizedAudio};
use crate::room::{Room, RoomInputOptions};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, mpsc};
use tracing::info;

/// Room whose participant is the paired [`RoomPeer`].
pub struct ChannelRoom {
    name: String,
    inbound: Mutex<mpsc::Receiver<RoomEvent>>,
    outbound: mpsc::UnboundedSender<RoomOutput>,
    connected: AtomicBool,
    input_options: std::sync::Mutex<Option<RoomInputOptions>>,
}

/// Participant side of a [`ChannelRoom`].
pub struct RoomPeer {
    /// Inject participant events.
    pub events: mpsc::Sender<RoomEvent>,
    /// Everything the agent published, in order.
    pub outputs: mpsc::UnboundedReceiver<RoomOutput>,
}

impl ChannelRoom {
    /// Create a room and its participant peer.
    pub fn pair(name: impl Into<String>, buffer: usize) -> (Arc<Self>, RoomPeer) {
        let (events_tx, events_rx) = mpsc::channel(buffer.max(1));
        let (outputs_tx, outputs_rx) = mpsc::unbounded_channel();
        let room = Arc::new(Self {
            name: name.into(),
            inbound: Mutex::new(events_rx),
            outbound: outputs_tx,
            connected: AtomicBool::new(false),
            input_options: std::sync::Mutex::new(None),
        });
        let peer = RoomPeer {
            events: events_tx,
            outputs: outputs_rx,
        };
        (room, peer)
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    /// Options applied by the last `configure_input` call.
    pub fn input_options(&self) -> Option<RoomInputOptions> {
        self.input_options.lock().ok().and_then(|o| *o)
    }

    fn publish(&self, output: RoomOutput) -> Result<()> {
        if !self.is_connected() {
            return Err(AgentError::Room(format!(
                "room '{}' is not connected",
                self.name
            )));
        }
        self.outbound
            .send(output)
            .map_err(|_| AgentError::Channel(format!("room '{}' peer dropped", self.name)))
    }
}

#[async_trait]
impl Room for ChannelRoom {
    fn name(&self) -> &str {
        &self.name
    }

    async fn connect(&self) -> Result<()> {
        self.connected.store(true, Ordering::Relaxed);
        info!(room = %self.name, "room connected");
        Ok(())
    }

    fn configure_input(&self, options: &RoomInputOptions) -> Result<()> {
        let mut slot = self
            .input_options
            .lock()
            .map_err(|_| AgentError::Room("input options lock poisoned".into()))?;
        *slot = Some(*options);
        Ok(())
    }

    async fn next_event(&self) -> Option<RoomEvent> {
        self.inbound.lock().await.recv().await
    }

    async fn publish_text(&self, text: &str) -> Result<()> {
        self.publish(RoomOutput::Text(text.to_owned()))
    }

    async fn publish_audio(&self, audio: SynthesizedAudio) -> Result<()> {
        self.publish(RoomOutput::Audio(audio))
    }
}
