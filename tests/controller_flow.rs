//! Drives the controller the way a display layer would: commands in,
//! session snapshots and reports out.

use std::time::Duration;

use tokio::sync::mpsc;

use ai_console_cli::capture::{CaptureAdapter, CaptureConfig};
use ai_console_cli::channel::EventChannel;
use ai_console_cli::model::{ConsoleEvent, RunReport, RunStatus, SimConfig};
use ai_console_cli::orchestrator::{run_controller, UiCommand};
use ai_console_cli::simulator::RunSimulator;

const TICK: Duration = Duration::from_millis(600);

struct Console {
    cmd_tx: mpsc::UnboundedSender<UiCommand>,
    evt_rx: mpsc::UnboundedReceiver<ConsoleEvent>,
    controller: tokio::task::JoinHandle<anyhow::Result<()>>,
}

fn spawn_console(capture_cfg: CaptureConfig) -> Console {
    let channel = EventChannel::new();
    let sim_cfg = SimConfig {
        tick_interval: TICK,
        ..SimConfig::default()
    };
    let simulator = RunSimulator::new(channel.clone(), sim_cfg);
    let capture = CaptureAdapter::new(simulator, capture_cfg);

    let (evt_tx, evt_rx) = mpsc::unbounded_channel();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let controller = tokio::spawn(run_controller(capture, channel, None, evt_tx, cmd_rx));
    Console {
        cmd_tx,
        evt_rx,
        controller,
    }
}

async fn next_event(console: &mut Console) -> ConsoleEvent {
    tokio::time::timeout(Duration::from_secs(120), console.evt_rx.recv())
        .await
        .expect("timed out waiting for a console event")
        .expect("controller hung up")
}

/// Consume events until the run finishes, returning the report and every
/// observed (status, progress) pair along the way.
async fn follow_to_report(console: &mut Console) -> (RunReport, Vec<(RunStatus, u8)>) {
    let mut observed = Vec::new();
    loop {
        match next_event(console).await {
            ConsoleEvent::Session(session) => observed.push((session.status, session.progress)),
            ConsoleEvent::RunFinished { report } => return (*report, observed),
            ConsoleEvent::Info(_) | ConsoleEvent::ChatReply { .. } => {}
        }
    }
}

#[tokio::test(start_paused = true)]
async fn full_lifecycle_reaches_succeeded_report() {
    let mut console = spawn_console(CaptureConfig::default());

    console.cmd_tx.send(UiCommand::StartRecording).unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    console.cmd_tx.send(UiCommand::StopAndSubmit).unwrap();

    let (report, observed) = follow_to_report(&mut console).await;

    assert_eq!(report.status, RunStatus::Succeeded);
    assert_eq!(report.progress, 100);
    assert!(report.run_id.is_some());
    assert!(report.error.is_none());
    let result = report.result.expect("succeeded report missing result");
    assert!(!result.summary.is_empty());

    // The session walked the expected path: recording, uploading, queued,
    // processing, succeeded.
    let statuses: Vec<RunStatus> = observed.iter().map(|(s, _)| *s).collect();
    assert_eq!(statuses.first(), Some(&RunStatus::Recording));
    assert!(statuses.contains(&RunStatus::Uploading));
    assert!(statuses.contains(&RunStatus::Queued));
    assert_eq!(statuses.last(), Some(&RunStatus::Succeeded));

    // Progress never moved backwards once the run was queued.
    let queued_at = observed
        .iter()
        .position(|(s, _)| *s == RunStatus::Queued)
        .unwrap();
    let run_progress: Vec<u8> = observed[queued_at..].iter().map(|(_, p)| *p).collect();
    assert!(run_progress.windows(2).all(|w| w[0] <= w[1]));

    console.cmd_tx.send(UiCommand::Quit).unwrap();
    console.controller.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn denied_capture_surfaces_as_local_failure() {
    let mut console = spawn_console(CaptureConfig {
        deny_permission: true,
    });

    console.cmd_tx.send(UiCommand::StartRecording).unwrap();
    let (report, observed) = follow_to_report(&mut console).await;

    assert_eq!(report.status, RunStatus::Failed);
    assert!(report.run_id.is_none(), "no run exists for a denied capture");
    let error = report.error.expect("failed report missing error message");
    assert!(error.contains("permission denied"));
    assert_eq!(
        observed.last().map(|(s, _)| *s),
        Some(RunStatus::Failed)
    );

    console.cmd_tx.send(UiCommand::Quit).unwrap();
    console.controller.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn cancel_resets_the_session_and_ends_delivery() {
    let mut console = spawn_console(CaptureConfig::default());

    console.cmd_tx.send(UiCommand::StartRecording).unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    console.cmd_tx.send(UiCommand::StopAndSubmit).unwrap();

    // Let the run get under way, then cancel it.
    tokio::time::sleep(TICK * 2).await;
    console.cmd_tx.send(UiCommand::CancelRun).unwrap();

    // After cancellation the session must come back as Idle.
    let mut saw_idle = false;
    loop {
        match tokio::time::timeout(Duration::from_secs(60), console.evt_rx.recv()).await {
            Ok(Some(ConsoleEvent::Session(session))) => {
                if session.status == RunStatus::Idle {
                    saw_idle = true;
                    assert_eq!(session.progress, 0);
                    assert!(session.result.is_none());
                }
                assert_ne!(session.status, RunStatus::Succeeded);
            }
            Ok(Some(ConsoleEvent::RunFinished { .. })) => {
                panic!("cancelled run must not produce a report");
            }
            Ok(Some(_)) => {}
            Ok(None) => panic!("controller hung up"),
            Err(_) => break, // no further events: delivery has ended
        }
    }
    assert!(saw_idle, "session never reset to Idle after cancel");

    console.cmd_tx.send(UiCommand::Quit).unwrap();
    console.controller.await.unwrap().unwrap();
}

#[tokio::test]
async fn chat_send_yields_canned_reply() {
    let mut console = spawn_console(CaptureConfig::default());

    console
        .cmd_tx
        .send(UiCommand::ChatSend("hello there".to_string()))
        .unwrap();
    loop {
        match next_event(&mut console).await {
            ConsoleEvent::ChatReply { text } => {
                assert!(text.starts_with("Hello!"));
                break;
            }
            _ => {}
        }
    }

    console.cmd_tx.send(UiCommand::Quit).unwrap();
    console.controller.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn stop_without_recording_is_rejected_without_a_run() {
    let mut console = spawn_console(CaptureConfig::default());

    console.cmd_tx.send(UiCommand::StopAndSubmit).unwrap();
    match next_event(&mut console).await {
        ConsoleEvent::Info(info) => {
            assert!(info.to_message().contains("cannot move"));
        }
        other => panic!("expected a rejection info line, got {other:?}"),
    }

    console.cmd_tx.send(UiCommand::Quit).unwrap();
    console.controller.await.unwrap().unwrap();
}
