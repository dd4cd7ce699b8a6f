//! Run lifecycle controller.
//!
//! Translates UI commands into capture/submit/cancel operations, follows the
//! active run's topic, and emits merged session snapshots for presentation
//! layers.

use anyhow::Result;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::capture::CaptureAdapter;
use crate::channel::{EventChannel, Subscription};
use crate::chat;
use crate::model::{ConsoleEvent, InfoEvent, RunId, StatusEvent};
use crate::session::ConsoleSession;
use crate::simulator::RunHandle;

/// Commands emitted by UI layers to drive the console.
#[derive(Debug, Clone)]
pub enum UiCommand {
    StartRecording,
    StopAndSubmit,
    CancelRun,
    ChatSend(String),
    Quit,
}

/// The run the session is currently following.
struct ActiveRun {
    handle: RunHandle,
    subscription: Subscription,
}

/// Drive the console until [`UiCommand::Quit`] (or the command channel
/// closes). Every session change is emitted as a [`ConsoleEvent::Session`]
/// snapshot; a terminal status additionally yields
/// [`ConsoleEvent::RunFinished`].
pub async fn run_controller(
    mut capture: CaptureAdapter,
    channel: EventChannel,
    export_json: Option<PathBuf>,
    event_tx: UnboundedSender<ConsoleEvent>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> Result<()> {
    let export = export_json.as_deref();
    let mut session = ConsoleSession::new();
    let mut active: Option<ActiveRun> = None;
    // Bridge from the synchronous channel listeners into this task.
    let (run_tx, mut run_rx) = mpsc::unbounded_channel::<(RunId, StatusEvent)>();

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UiCommand::StartRecording) => {
                        handle_start(&mut capture, &mut session, &event_tx, active.is_some(), export).await;
                    }
                    Some(UiCommand::StopAndSubmit) => {
                        handle_submit(&mut capture, &channel, &run_tx, &mut session, &mut active, &event_tx, export).await;
                    }
                    Some(UiCommand::CancelRun) => {
                        match active.take() {
                            Some(run) => {
                                run.handle.cancel();
                                run.subscription.unsubscribe();
                                let _ = event_tx.send(ConsoleEvent::Info(InfoEvent::RunCancelled {
                                    run_id: run.handle.run_id().clone(),
                                }));
                                session.reset();
                                let _ = event_tx.send(ConsoleEvent::Session(session.clone()));
                            }
                            None => {
                                let _ = event_tx.send(ConsoleEvent::Info(InfoEvent::Message(
                                    "No active run to cancel".to_string(),
                                )));
                            }
                        }
                    }
                    Some(UiCommand::ChatSend(text)) => {
                        let _ = event_tx.send(ConsoleEvent::ChatReply {
                            text: chat::canned_reply(&text),
                        });
                    }
                    Some(UiCommand::Quit) | None => {
                        if let Some(run) = active.take() {
                            run.handle.cancel();
                            run.subscription.unsubscribe();
                        }
                        break;
                    }
                }
            }
            Some((run_id, update)) = run_rx.recv() => {
                // Stale updates from an abandoned run are dropped here; the
                // listener itself was already unsubscribed.
                let following = active
                    .as_ref()
                    .is_some_and(|run| run.handle.run_id() == &run_id);
                if !following {
                    continue;
                }
                session.apply(&update);
                let _ = event_tx.send(ConsoleEvent::Session(session.clone()));
                if update.is_terminal() {
                    if let Some(run) = active.take() {
                        run.subscription.unsubscribe();
                        finish(&session, Some(run.handle.run_id()), export, &event_tx);
                    }
                }
            }
        }
    }
    Ok(())
}

async fn handle_start(
    capture: &mut CaptureAdapter,
    session: &mut ConsoleSession,
    event_tx: &UnboundedSender<ConsoleEvent>,
    run_in_flight: bool,
    export: Option<&Path>,
) {
    if run_in_flight {
        let _ = event_tx.send(ConsoleEvent::Info(InfoEvent::Message(
            "A run is still in flight".to_string(),
        )));
        return;
    }
    if let Err(e) = session.start_recording() {
        let _ = event_tx.send(ConsoleEvent::Info(InfoEvent::Message(e.to_string())));
        return;
    }
    match capture.start_capture().await {
        Ok(()) => {
            let _ = event_tx.send(ConsoleEvent::Info(InfoEvent::CaptureStarted));
            let _ = event_tx.send(ConsoleEvent::Session(session.clone()));
        }
        Err(e) => {
            tracing::warn!(error = %e, "capture start failed");
            // Capture-start failure is terminal for the session but local to
            // it: no run exists and no channel traffic happens.
            session.apply(&StatusEvent::failed(e.to_string()));
            let _ = event_tx.send(ConsoleEvent::Session(session.clone()));
            finish(session, None, export, event_tx);
        }
    }
}

async fn handle_submit(
    capture: &mut CaptureAdapter,
    channel: &EventChannel,
    run_tx: &UnboundedSender<(RunId, StatusEvent)>,
    session: &mut ConsoleSession,
    active: &mut Option<ActiveRun>,
    event_tx: &UnboundedSender<ConsoleEvent>,
    export: Option<&Path>,
) {
    if let Err(e) = session.begin_upload() {
        let _ = event_tx.send(ConsoleEvent::Info(InfoEvent::Message(e.to_string())));
        return;
    }
    let _ = event_tx.send(ConsoleEvent::Session(session.clone()));

    match capture.stop_capture_and_submit().await {
        Ok(handle) => {
            let run_id = handle.run_id().clone();
            // Subscribe before the simulator's first tick can publish.
            let forward_id = run_id.clone();
            let forward_tx = run_tx.clone();
            let subscription = channel.subscribe(&run_id, move |update| {
                let _ = forward_tx.send((forward_id.clone(), update.clone()));
            });
            let _ = event_tx.send(ConsoleEvent::Info(InfoEvent::RunSubmitted {
                run_id: run_id.clone(),
            }));
            *active = Some(ActiveRun {
                handle,
                subscription,
            });
        }
        Err(e) => {
            tracing::warn!(error = %e, "submission failed");
            session.apply(&StatusEvent::failed(e.to_string()));
            let _ = event_tx.send(ConsoleEvent::Session(session.clone()));
            finish(session, None, export, event_tx);
        }
    }
}

fn finish(
    session: &ConsoleSession,
    run_id: Option<&RunId>,
    export_json: Option<&Path>,
    event_tx: &UnboundedSender<ConsoleEvent>,
) {
    let processed = super::process_run_completion(run_id, session, export_json);
    for msg in processed.export_messages {
        let _ = event_tx.send(ConsoleEvent::Info(InfoEvent::Message(msg)));
    }
    let _ = event_tx.send(ConsoleEvent::RunFinished {
        report: Box::new(processed.report),
    });
}
