//! End-to-end game-master sessions over an in-process room.

use crate::helpers::{
    FixedStt, Heard, ScriptedLlm, both, drain_outputs, providers, speak, test_config,
    type_then_leave,
};
use aureon::agent::{INTRO, NUDGE_SPEECH, NUDGE_TEXT, WELCOME};
use aureon::config::{AgentConfig, NoiseCancellation};
use aureon::llm::ChatMessage;
use aureon::pipeline::messages::RoomEvent;
use aureon::room::{ChannelRoom, RoomInputOptions};
use aureon::{
    JobContext, JobRequest, Providers, Worker, WorkerReport, game_master_entrypoint,
    game_master_worker,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

async fn run_job(config: AgentConfig, providers: Providers, room: Arc<ChannelRoom>) -> WorkerReport {
    let (tx, rx) = mpsc::channel(1);
    tx.send(JobRequest::new(room)).await.unwrap();
    drop(tx);
    Worker::new(Arc::new(config), game_master_worker(providers))
        .run(rx, CancellationToken::new())
        .await
        .unwrap()
}

fn nudge() -> Vec<Heard> {
    vec![
        Heard::Text(NUDGE_TEXT.to_owned()),
        Heard::Speech(NUDGE_SPEECH.to_owned()),
    ]
}

#[tokio::test]
async fn typed_playthrough_gates_then_narrates() {
    let config = test_config();
    let llm = ScriptedLlm::new(&["Wolves circle the rune stone."]);
    let (room, mut peer) = ChannelRoom::pair("eldoria", 16);

    type_then_leave(&peer, &["who are you?", "  Let's Start ", "I follow the howl."]).await;
    let report = run_job(config.clone(), providers(&config, llm.clone()), room.clone()).await;

    assert_eq!(report, WorkerReport { jobs_completed: 1, jobs_failed: 0 });
    assert!(room.is_connected());

    let narrated = "Wolves circle the rune stone.\n\n\u{2026}What do you do next?";
    let expected = [both(WELCOME), nudge(), both(INTRO), both(narrated)].concat();
    assert_eq!(drain_outputs(&mut peer), expected);

    let calls = llm.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].system_prompt.contains("Aureon"));
    assert_eq!(
        calls[0].history,
        vec![
            ChatMessage::assistant(INTRO),
            ChatMessage::user("I follow the howl."),
        ]
    );
}

#[tokio::test]
async fn model_is_never_called_before_the_story_starts() {
    let config = test_config();
    let llm = ScriptedLlm::new(&[]);
    let (room, mut peer) = ChannelRoom::pair("eldoria", 16);

    type_then_leave(&peer, &["hello there", "tell me a story", "hi!"]).await;
    run_job(config.clone(), providers(&config, llm.clone()), room).await;

    assert!(llm.calls().is_empty());
    let expected = [both(WELCOME), nudge(), nudge(), nudge()].concat();
    assert_eq!(drain_outputs(&mut peer), expected);
}

#[tokio::test]
async fn history_carries_earlier_narration() {
    let config = test_config();
    let llm = ScriptedLlm::new(&[
        "A shadow moves between the trees.",
        "The path ends here\u{2026}What do you do next?",
    ]);
    let (room, mut peer) = ChannelRoom::pair("eldoria", 16);

    type_then_leave(&peer, &["begin", "I wait.", "I step forward."]).await;
    run_job(config.clone(), providers(&config, llm.clone()), room).await;

    let calls = llm.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(
        calls[1].history,
        vec![
            ChatMessage::assistant(INTRO),
            ChatMessage::user("I wait."),
            ChatMessage::assistant(
                "A shadow moves between the trees.\n\n\u{2026}What do you do next?"
            ),
            ChatMessage::user("I step forward."),
        ]
    );

    // A reply that already ends with the closer is not closed twice.
    let heard = drain_outputs(&mut peer);
    assert_eq!(
        heard.last(),
        Some(&Heard::Speech(
            "The path ends here\u{2026}What do you do next?".to_owned()
        ))
    );
}

#[tokio::test]
async fn spoken_greeting_starts_the_story() {
    let config = test_config();
    let llm = ScriptedLlm::new(&[]);
    let (room, mut peer) = ChannelRoom::pair("eldoria", 16);

    speak(&peer).await;
    peer.events.send(RoomEvent::Disconnected).await.unwrap();

    let providers = providers(&config, llm.clone()).with_stt(Arc::new(FixedStt("Start")));
    run_job(config, providers, room).await;

    assert_eq!(drain_outputs(&mut peer), [both(WELCOME), both(INTRO)].concat());
    assert!(llm.calls().is_empty());
}

#[tokio::test]
async fn room_input_uses_configured_noise_cancellation() {
    let mut config = test_config();
    config.room.noise_cancellation = NoiseCancellation::BvcTelephony;
    let (room, peer) = ChannelRoom::pair("phone", 4);

    type_then_leave(&peer, &[]).await;
    run_job(config.clone(), providers(&config, ScriptedLlm::new(&[])), room.clone()).await;

    assert_eq!(
        room.input_options(),
        Some(RoomInputOptions {
            noise_cancellation: NoiseCancellation::BvcTelephony
        })
    );
}

#[tokio::test]
async fn entrypoint_reports_session_summary() {
    let config = Arc::new(test_config());
    let (room, peer) = ChannelRoom::pair("eldoria", 16);
    type_then_leave(&peer, &["what?", "ready", "I draw my sword."]).await;

    let ctx = JobContext {
        job_id: "job-1".to_owned(),
        room,
        proc: Arc::new(aureon::startup::prewarm(&config).unwrap()),
        config: Arc::clone(&config),
        shutdown: CancellationToken::new(),
    };
    let summary = game_master_entrypoint(ctx, providers(&config, ScriptedLlm::new(&[])))
        .await
        .unwrap();

    assert_eq!(summary.user_turns, 3);
    assert_eq!(summary.model_calls, 1);
    assert!(summary.story_started);
}
