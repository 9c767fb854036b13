//! Terminal room: stdin lines are typed turns, agent output goes to stdout.

use crate::error::Result;
use crate::pipeline::messages::{RoomEvent, SynthesizedAudio};
use crate::room::Room;
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Line typed to leave the console session.
const QUIT_COMMAND: &str = "/quit";

/// Room reading the player's turns from stdin.
pub struct ConsoleRoom {
    name: String,
    display_name: String,
    show_speech: bool,
    lines: Mutex<Lines<BufReader<Stdin>>>,
}

impl ConsoleRoom {
    /// Create a console room. With `show_speech`, speech channel output is
    /// printed too (it mostly repeats the text channel).
    pub fn new(display_name: impl Into<String>, show_speech: bool) -> Self {
        Self {
            name: "console".to_owned(),
            display_name: display_name.into(),
            show_speech,
            lines: Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
        }
    }
}

#[async_trait]
impl Room for ConsoleRoom {
    fn name(&self) -> &str {
        &self.name
    }

    async fn connect(&self) -> Result<()> {
        println!("Type to speak with {}. {QUIT_COMMAND} to leave.\n", self.display_name);
        Ok(())
    }

    async fn next_event(&self) -> Option<RoomEvent> {
        let mut lines = self.lines.lock().await;
        match lines.next_line().await {
            Ok(Some(line)) if line.trim() == QUIT_COMMAND => Some(RoomEvent::Disconnected),
            Ok(Some(line)) => Some(RoomEvent::Text(line)),
            Ok(None) => None,
            Err(e) => {
                warn!("stdin read failed: {e}");
                None
            }
        }
    }

    async fn publish_text(&self, text: &str) -> Result<()> {
        println!("\n[{}] {text}\n", self.display_name);
        Ok(())
    }

    async fn publish_audio(&self, audio: SynthesizedAudio) -> Result<()> {
        debug!(
            samples = audio.samples.len(),
            sample_rate = audio.sample_rate,
            "speech published"
        );
        if self.show_speech {
            println!("[{} (spoken)] {}\n", self.display_name, audio.text);
        }
        Ok(())
    }
}
