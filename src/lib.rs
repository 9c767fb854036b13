//! Aureon: a scripted game-master voice agent.
//!
//! A worker process serves conversations ("jobs"), one room each:
//! Room audio → VAD → STT → turn detection → dialogue gate → LLM → TTS → Room
//!
//! # Architecture
//!
//! - **Dialogue gate** ([`agent`]): keeps the story closed until the player
//!   greets Aureon, then hands turns to the model and closes every reply
//!   with "…What do you do next?"
//! - **Session** ([`pipeline::session`]): wires the providers to a room and
//!   runs the gate turn by turn.
//! - **Worker** ([`worker`]): loads the VAD once per process and runs the
//!   entrypoint ([`entrypoint`]) for every dispatched room.
//!
//! Speech recognition, speech synthesis and turn detection are provider
//! seams ([`stt`], [`tts`], [`turn`]); the LLM seam ships with an
//! OpenAI-compatible HTTP client.

pub mod agent;
pub mod config;
pub mod entrypoint;
pub mod error;
pub mod llm;
pub mod personality;
pub mod pipeline;
pub mod room;
pub mod startup;
pub mod stt;
pub mod tts;
pub mod turn;
pub mod vad;
pub mod worker;

pub use agent::{GameMasterAgent, StoryState};
pub use config::AgentConfig;
pub use entrypoint::{Providers, game_master_entrypoint, game_master_worker};
pub use error::{AgentError, Result};
pub use pipeline::session::{AgentSession, SessionHandle, SessionSummary};
pub use startup::PrewarmedResources;
pub use worker::{JobContext, JobRequest, Worker, WorkerOptions, WorkerReport};
