//! Mock capture adapter.
//!
//! Simulates the microphone lifecycle: permission grant on start, an
//! in-progress recording, and stop-and-submit handing the finished capture
//! to the run simulator. Nothing is actually recorded.

use tokio::time::Instant;

use crate::error::{ConsoleError, ConsoleResult};
use crate::simulator::{RunHandle, RunSimulator};

/// Behavior switches for the mock capture device.
#[derive(Debug, Clone, Default)]
pub struct CaptureConfig {
    /// Simulate the user rejecting the microphone permission prompt.
    pub deny_permission: bool,
}

pub struct CaptureAdapter {
    simulator: RunSimulator,
    cfg: CaptureConfig,
    recording_since: Option<Instant>,
}

impl CaptureAdapter {
    pub fn new(simulator: RunSimulator, cfg: CaptureConfig) -> Self {
        Self {
            simulator,
            cfg,
            recording_since: None,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.recording_since.is_some()
    }

    /// Begin the mock capture phase. Fails when permission is denied or a
    /// capture is already in progress.
    pub async fn start_capture(&mut self) -> ConsoleResult<()> {
        if self.cfg.deny_permission {
            return Err(ConsoleError::PermissionDenied(
                "user rejected the prompt".to_string(),
            ));
        }
        if self.recording_since.is_some() {
            return Err(ConsoleError::AlreadyRecording);
        }
        self.recording_since = Some(Instant::now());
        Ok(())
    }

    /// Finalize the mock capture and submit it as a new run.
    pub async fn stop_capture_and_submit(&mut self) -> ConsoleResult<RunHandle> {
        let started = self.recording_since.take().ok_or(ConsoleError::NotRecording)?;
        let captured_ms = started.elapsed().as_millis() as u64;
        tracing::debug!(captured_ms, "capture finalized, submitting run");
        Ok(self.simulator.begin_run())
    }
}
