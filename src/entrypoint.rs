//! Per-job entrypoint: the game-master session for one room.

use crate::agent::GameMasterAgent;
use crate::error::Result;
use crate::llm::LanguageModel;
use crate::pipeline::session::{AgentSession, SessionSummary};
use crate::room::RoomInputOptions;
use crate::stt::SpeechToText;
use crate::tts::TextToSpeech;
use crate::turn::TurnDetector;
use crate::worker::{JobContext, WorkerOptions};
use std::sync::Arc;
use tracing::info;

/// Provider handles shared by every job of a worker.
#[derive(Clone)]
pub struct Providers {
    pub llm: Arc<dyn LanguageModel>,
    pub tts: Arc<dyn TextToSpeech>,
    pub stt: Option<Arc<dyn SpeechToText>>,
    pub turn_detector: Option<Arc<dyn TurnDetector>>,
}

impl Providers {
    pub fn new(llm: Arc<dyn LanguageModel>, tts: Arc<dyn TextToSpeech>) -> Self {
        Self {
            llm,
            tts,
            stt: None,
            turn_detector: None,
        }
    }

    pub fn with_stt(mut self, stt: Arc<dyn SpeechToText>) -> Self {
        self.stt = Some(stt);
        self
    }

    pub fn with_turn_detector(mut self, detector: Arc<dyn TurnDetector>) -> Self {
        self.turn_detector = Some(detector);
        self
    }
}

/// Connect the room, run a game-master session in it and wait for the end.
///
/// # Errors
///
/// Returns an error if the room cannot be connected, the session cannot be
/// built or started, or the session ends on a room failure.
pub async fn game_master_entrypoint(ctx: JobContext, providers: Providers) -> Result<SessionSummary> {
    ctx.connect().await?;

    let config = &ctx.config;
    info!(
        job_id = %ctx.job_id,
        stt = %format!("{}/{}", config.stt.provider, config.stt.model),
        language = %config.stt.language,
        llm = %config.llm.effective_provider_name(),
        tts = %format!("{}/{}", config.tts.provider, config.tts.voice),
        style = %config.tts.style,
        text_pacing = config.tts.text_pacing,
        turn_detection = ?config.turn_detection.mode,
        "provider selection"
    );

    let mut builder = AgentSession::builder(Arc::clone(&ctx.config))
        .llm(providers.llm)
        .tts(providers.tts)
        .vad(Arc::clone(&ctx.proc.vad));
    if let Some(stt) = providers.stt {
        builder = builder.stt(stt);
    }
    if let Some(detector) = providers.turn_detector {
        builder = builder.turn_detector(detector);
    }
    let session = builder.build()?;

    let agent = GameMasterAgent::new(&ctx.config.llm);
    let handle = session
        .start(
            agent,
            Arc::clone(&ctx.room),
            RoomInputOptions::from(&ctx.config.room),
            ctx.shutdown.clone(),
        )
        .await?;

    let summary = handle.wait().await?;
    info!(job_id = %ctx.job_id, ?summary, "game master session finished");
    Ok(summary)
}

/// Worker hooks running [`game_master_entrypoint`] for every job.
pub fn game_master_worker(providers: Providers) -> WorkerOptions {
    WorkerOptions::new(move |ctx: JobContext| {
        let providers = providers.clone();
        async move { game_master_entrypoint(ctx, providers).await.map(|_| ()) }
    })
}
