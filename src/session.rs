//! Observed run state.
//!
//! Merges partial status events into the state a display layer renders, and
//! enforces which transitions the UI may force locally: starting a recording
//! and moving a finished recording into upload. Everything else arrives as
//! delivered events.

use crate::error::{ConsoleError, ConsoleResult};
use crate::model::{AnalysisResult, RunStatus, StatusEvent};

/// Progress shown while an upload is in flight, before the first
/// server-confirmed event arrives.
const UPLOAD_OPTIMISTIC_PROGRESS: u8 = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct ConsoleSession {
    pub status: RunStatus,
    pub progress: u8,
    pub result: Option<AnalysisResult>,
    pub error: Option<String>,
}

impl Default for ConsoleSession {
    fn default() -> Self {
        Self {
            status: RunStatus::Idle,
            progress: 0,
            result: None,
            error: None,
        }
    }
}

impl ConsoleSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one delivered event: only the fields the event sets are applied.
    /// Progress is clamped to 0..=100.
    pub fn apply(&mut self, update: &StatusEvent) {
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(progress) = update.progress {
            self.progress = progress.min(100);
        }
        if let Some(result) = update.result.as_ref() {
            self.result = Some(result.clone());
        }
        if let Some(error) = update.error.as_ref() {
            self.error = Some(error.clone());
        }
    }

    /// Local optimistic transition into Recording. Allowed from Idle or from
    /// a finished run; clears the previous run's output.
    pub fn start_recording(&mut self) -> ConsoleResult<()> {
        if self.status.is_busy() {
            return Err(ConsoleError::InvalidTransition {
                from: self.status,
                to: RunStatus::Recording,
            });
        }
        self.status = RunStatus::Recording;
        self.progress = 0;
        self.result = None;
        self.error = None;
        Ok(())
    }

    /// Local optimistic transition Recording -> Uploading.
    pub fn begin_upload(&mut self) -> ConsoleResult<()> {
        if self.status != RunStatus::Recording {
            return Err(ConsoleError::InvalidTransition {
                from: self.status,
                to: RunStatus::Uploading,
            });
        }
        self.status = RunStatus::Uploading;
        self.progress = UPLOAD_OPTIMISTIC_PROGRESS;
        self.error = None;
        Ok(())
    }

    /// Back to Idle, e.g. after the active run is cancelled.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
