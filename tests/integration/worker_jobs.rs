//! Several rooms served by one worker.

use crate::helpers::{Heard, ScriptedLlm, both, drain_outputs, providers, test_config, type_then_leave};
use async_trait::async_trait;
use aureon::agent::{INTRO, NUDGE_TEXT, WELCOME};
use aureon::pipeline::messages::{RoomEvent, SynthesizedAudio};
use aureon::room::{ChannelRoom, Room};
use aureon::{AgentError, JobRequest, Result, Worker, game_master_worker};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// A room whose connection always fails.
struct UnreachableRoom;

#[async_trait]
impl Room for UnreachableRoom {
    fn name(&self) -> &str {
        "unreachable"
    }

    async fn connect(&self) -> Result<()> {
        Err(AgentError::Room("connection refused".into()))
    }

    async fn next_event(&self) -> Option<RoomEvent> {
        None
    }

    async fn publish_text(&self, _text: &str) -> Result<()> {
        Err(AgentError::Room("not connected".into()))
    }

    async fn publish_audio(&self, _audio: SynthesizedAudio) -> Result<()> {
        Err(AgentError::Room("not connected".into()))
    }
}

#[tokio::test]
async fn rooms_keep_independent_story_state() {
    let config = test_config();
    let (started_room, mut started) = ChannelRoom::pair("started", 8);
    let (waiting_room, mut waiting) = ChannelRoom::pair("waiting", 8);
    type_then_leave(&started, &["start", "I look around."]).await;
    type_then_leave(&waiting, &["I look around."]).await;

    let (tx, rx) = mpsc::channel(4);
    tx.send(JobRequest::new(started_room)).await.unwrap();
    tx.send(JobRequest::new(waiting_room)).await.unwrap();
    drop(tx);

    let llm = ScriptedLlm::new(&["Fog parts before you."]);
    let report = Worker::new(Arc::new(config.clone()), game_master_worker(providers(&config, llm.clone())))
        .run(rx, CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(report.jobs_completed, 2);

    let narrated = "Fog parts before you.\n\n\u{2026}What do you do next?";
    assert_eq!(
        drain_outputs(&mut started),
        [both(WELCOME), both(INTRO), both(narrated)].concat()
    );
    let heard = drain_outputs(&mut waiting);
    assert_eq!(heard[..2], both(WELCOME)[..]);
    assert_eq!(heard[2], Heard::Text(NUDGE_TEXT.to_owned()));
    assert_eq!(llm.calls().len(), 1);
}

#[tokio::test]
async fn unreachable_room_fails_only_its_job() {
    let config = test_config();
    let (room, peer) = ChannelRoom::pair("reachable", 4);
    type_then_leave(&peer, &[]).await;

    let (tx, rx) = mpsc::channel(4);
    tx.send(JobRequest::new(Arc::new(UnreachableRoom))).await.unwrap();
    tx.send(JobRequest::new(room)).await.unwrap();
    drop(tx);

    let report = Worker::new(
        Arc::new(config.clone()),
        game_master_worker(providers(&config, ScriptedLlm::new(&[]))),
    )
    .run(rx, CancellationToken::new())
    .await
    .unwrap();
    assert_eq!(report.jobs_completed, 1);
    assert_eq!(report.jobs_failed, 1);
}

#[tokio::test]
async fn shutdown_ends_open_sessions() {
    let config = test_config();
    let (room, mut peer) = ChannelRoom::pair("lingering", 4);

    let (tx, rx) = mpsc::channel(1);
    tx.send(JobRequest::new(room)).await.unwrap();

    let cancel = CancellationToken::new();
    let worker = tokio::spawn(
        Worker::new(
            Arc::new(config.clone()),
            game_master_worker(providers(&config, ScriptedLlm::new(&[]))),
        )
        .run(rx, cancel.clone()),
    );

    tokio::time::sleep(Duration::from_millis(50)).await;
    cancel.cancel();
    let report = tokio::time::timeout(Duration::from_secs(5), worker)
        .await
        .expect("worker stops after cancel")
        .unwrap()
        .unwrap();

    assert_eq!(report.jobs_completed, 1);
    assert_eq!(drain_outputs(&mut peer), both(WELCOME));
    drop(tx);
}
