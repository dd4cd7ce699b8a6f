use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::capture::{CaptureAdapter, CaptureConfig};
use crate::channel::EventChannel;
use crate::model::{ConsoleEvent, FailurePlan, RunReport, SimConfig};
use crate::orchestrator::{run_controller, UiCommand};
use crate::simulator::RunSimulator;
use crate::text_summary::build_text_summary;

/// Output line routing for stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "ai-console-cli",
    version,
    about = "Mock AI analysis console with optional TUI"
)]
pub struct Cli {
    /// Print the final run report as JSON and exit (no TUI)
    #[arg(long)]
    pub json: bool,

    /// Print a text summary and exit (no TUI)
    #[arg(long)]
    pub text: bool,

    /// Run silently: suppress all output except errors
    #[arg(long)]
    pub silent: bool,

    /// Interval between simulated progress ticks
    #[arg(long, default_value = "600ms")]
    pub tick_interval: humantime::Duration,

    /// Smallest progress increment per tick
    #[arg(long, default_value_t = 5)]
    pub min_step: u8,

    /// Largest progress increment per tick
    #[arg(long, default_value_t = 22)]
    pub max_step: u8,

    /// Inject a failure once progress crosses this threshold
    #[arg(long)]
    pub fail_at: Option<u8>,

    /// Error message attached to the injected failure
    #[arg(long, default_value = "simulated backend failure")]
    pub fail_message: String,

    /// Simulate the user rejecting the microphone permission prompt
    #[arg(long)]
    pub deny_capture: bool,

    /// How long the scripted demo records before submitting (text/json modes)
    #[arg(long, default_value = "1s")]
    pub record_for: humantime::Duration,

    /// Export the final run report as JSON
    #[arg(long)]
    pub export_json: Option<std::path::PathBuf>,
}

pub async fn run(args: Cli) -> Result<()> {
    // Validate that --silent can only be used with --json
    if args.silent && !args.json {
        return Err(anyhow::anyhow!(
            "--silent can only be used with --json. Use --silent --json together."
        ));
    }
    build_sim_config(&args)
        .validate()
        .context("invalid simulator configuration")?;

    if args.silent {
        return run_scripted(args, OutputMode::Silent).await;
    }

    if !args.json && !args.text {
        #[cfg(feature = "tui")]
        {
            return crate::tui::run(args).await;
        }
        #[cfg(not(feature = "tui"))]
        {
            // Fallback when built without TUI support.
            return run_scripted(args, OutputMode::Text).await;
        }
    }

    if args.json {
        return run_scripted(args, OutputMode::Json).await;
    }

    run_scripted(args, OutputMode::Text).await
}

/// Build a `SimConfig` from CLI arguments.
pub fn build_sim_config(args: &Cli) -> SimConfig {
    SimConfig {
        tick_interval: Duration::from(args.tick_interval),
        min_step: args.min_step,
        max_step: args.max_step,
        failure: args.fail_at.map(|at_progress| FailurePlan {
            at_progress,
            message: args.fail_message.clone(),
        }),
    }
}

/// Wire up channel, simulator and capture adapter from CLI arguments.
pub fn build_console(args: &Cli) -> (EventChannel, CaptureAdapter) {
    let channel = EventChannel::new();
    let simulator = RunSimulator::new(channel.clone(), build_sim_config(args));
    let capture = CaptureAdapter::new(
        simulator,
        CaptureConfig {
            deny_permission: args.deny_capture,
        },
    );
    (channel, capture)
}

#[derive(Clone, Copy, PartialEq)]
enum OutputMode {
    Text,
    Json,
    Silent,
}

/// Non-interactive demo: record for a fixed duration, submit, follow the run
/// to its terminal status, then print the report.
async fn run_scripted(args: Cli, mode: OutputMode) -> Result<()> {
    let (channel, capture) = build_console(&args);

    let (evt_tx, mut evt_rx) = mpsc::unbounded_channel::<ConsoleEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();
    let controller = tokio::spawn(run_controller(
        capture,
        channel,
        args.export_json.clone(),
        evt_tx,
        cmd_rx,
    ));

    let (out_tx, out_handle) = if mode == OutputMode::Silent {
        (None, None)
    } else {
        let (tx, handle) = spawn_output_writer();
        (Some(tx), Some(handle))
    };
    let stderr_line = |msg: String| {
        if mode == OutputMode::Text {
            if let Some(tx) = out_tx.as_ref() {
                let _ = tx.send(OutputLine::Stderr(msg));
            }
        }
    };

    // Scripted command sequence standing in for the start/stop buttons.
    let record_for = Duration::from(args.record_for);
    let script_tx = cmd_tx.clone();
    let script = tokio::spawn(async move {
        let _ = script_tx.send(UiCommand::StartRecording);
        tokio::time::sleep(record_for).await;
        let _ = script_tx.send(UiCommand::StopAndSubmit);
    });

    let mut final_report: Option<RunReport> = None;
    while let Some(ev) = evt_rx.recv().await {
        match ev {
            ConsoleEvent::Session(session) => {
                stderr_line(format!(
                    "{} {}%",
                    session.status.label(),
                    session.progress
                ));
            }
            ConsoleEvent::Info(info) => {
                stderr_line(info.to_message());
            }
            ConsoleEvent::ChatReply { .. } => {}
            ConsoleEvent::RunFinished { report } => {
                final_report = Some(*report);
                let _ = cmd_tx.send(UiCommand::Quit);
            }
        }
    }

    script.await.context("demo script task failed")?;
    controller
        .await
        .context("controller task failed")?
        .context("controller returned an error")?;

    let report = final_report.context("demo produced no final report")?;
    if let Some(tx) = out_tx.as_ref() {
        match mode {
            OutputMode::Text => {
                for line in build_text_summary(&report).lines {
                    let _ = tx.send(OutputLine::Stdout(line));
                }
            }
            OutputMode::Json => {
                let out = serde_json::to_string_pretty(&report)?;
                let _ = tx.send(OutputLine::Stdout(out));
            }
            OutputMode::Silent => {}
        }
    }

    if let Some(tx) = out_tx {
        drop(tx);
    }
    if let Some(handle) = out_handle {
        let _ = handle.await;
    }

    Ok(())
}
