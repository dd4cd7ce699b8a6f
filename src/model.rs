use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::error::{ConsoleError, ConsoleResult};
use crate::session::ConsoleSession;

/// Opaque identifier for one capture-to-result lifecycle. Generated at
/// submission time, never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(String);

impl RunId {
    /// Generate a fresh identifier from random bytes.
    pub fn generate() -> Self {
        let mut b = [0u8; 8];
        rand::thread_rng().fill_bytes(&mut b);
        Self(format!("{:016x}", u64::from_le_bytes(b)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Idle,
    Recording,
    Uploading,
    Queued,
    Processing,
    Succeeded,
    Failed,
}

impl RunStatus {
    /// Terminal statuses: no further events are expected for the run.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// True while a capture or submission is in flight and a new recording
    /// cannot start.
    pub fn is_busy(self) -> bool {
        matches!(
            self,
            Self::Recording | Self::Uploading | Self::Queued | Self::Processing
        )
    }

    /// Badge label shown by presentation layers.
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Recording => "Recording...",
            Self::Uploading => "Uploading...",
            Self::Queued => "Queued...",
            Self::Processing => "Processing...",
            Self::Succeeded => "Completed",
            Self::Failed => "Failed",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
            Self::Uploading => "uploading",
            Self::Queued => "queued",
            Self::Processing => "processing",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Partial status update published on a run's topic. A given event sets only
/// a subset of fields; consumers merge set fields into prior observed state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StatusEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<RunStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<AnalysisResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StatusEvent {
    pub fn progressed(status: RunStatus, progress: u8) -> Self {
        Self {
            status: Some(status),
            progress: Some(progress),
            ..Self::default()
        }
    }

    pub fn succeeded(result: AnalysisResult) -> Self {
        Self {
            status: Some(RunStatus::Succeeded),
            progress: Some(100),
            result: Some(result),
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: Some(RunStatus::Failed),
            error: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_some_and(RunStatus::is_terminal)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

/// Analysis payload attached to a successful run. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub summary: String,
    pub entities: Vec<Entity>,
    pub notes: String,
}

impl AnalysisResult {
    /// The canned payload every successful mock run produces.
    pub fn mock() -> Self {
        Self {
            summary: "This is a mock analysis summary generated for demo purposes.".to_string(),
            entities: vec![
                Entity {
                    kind: "Person".to_string(),
                    value: "Alice".to_string(),
                },
                Entity {
                    kind: "Topic".to_string(),
                    value: "AI Discussion".to_string(),
                },
            ],
            notes: "Mock notes:\n- Key Insight 1\n- Key Insight 2".to_string(),
        }
    }
}

/// Tuning for the scripted run simulator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// Fixed interval between simulator ticks.
    #[serde(with = "humantime_serde")]
    pub tick_interval: Duration,
    /// Inclusive lower bound for the pseudo-random progress increment per tick.
    pub min_step: u8,
    /// Inclusive upper bound for the pseudo-random progress increment per tick.
    pub max_step: u8,
    /// Optional failure injection: publish a terminal `failed` event once
    /// progress crosses the threshold.
    #[serde(default)]
    pub failure: Option<FailurePlan>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailurePlan {
    pub at_progress: u8,
    pub message: String,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(600),
            min_step: 5,
            max_step: 22,
            failure: None,
        }
    }
}

impl SimConfig {
    pub fn validate(&self) -> ConsoleResult<()> {
        if self.tick_interval.is_zero() {
            return Err(ConsoleError::InvalidConfig(
                "tick interval must be non-zero".to_string(),
            ));
        }
        if self.min_step == 0 || self.min_step > self.max_step {
            return Err(ConsoleError::InvalidConfig(format!(
                "progress step range {}..={} is empty or stalls",
                self.min_step, self.max_step
            )));
        }
        Ok(())
    }
}

/// Final outcome of one run, for JSON output and export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    #[serde(default)]
    pub timestamp_utc: String,
    /// Absent when the session failed before a run was submitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<RunId>,
    pub status: RunStatus,
    pub progress: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<AnalysisResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Events emitted by the controller and consumed by presentation layers.
#[derive(Debug, Clone)]
pub enum ConsoleEvent {
    /// Merged session state after a local transition or a delivered update.
    Session(ConsoleSession),
    Info(InfoEvent),
    ChatReply {
        text: String,
    },
    /// The followed run reached a terminal status (or the session failed
    /// before one was submitted).
    RunFinished {
        // Box to keep ConsoleEvent size small; RunReport carries the full result.
        report: Box<RunReport>,
    },
}

/// Structured info lines emitted by the controller for UI/CLI layers.
#[derive(Debug, Clone)]
pub enum InfoEvent {
    Message(String),
    CaptureStarted,
    RunSubmitted { run_id: RunId },
    RunCancelled { run_id: RunId },
}

impl InfoEvent {
    /// Render a human-readable message for UI/CLI layers.
    pub fn to_message(&self) -> String {
        match self {
            InfoEvent::Message(msg) => msg.clone(),
            InfoEvent::CaptureStarted => "Capture started".to_string(),
            InfoEvent::RunSubmitted { run_id } => format!("Submitted run {}", run_id),
            InfoEvent::RunCancelled { run_id } => format!("Cancelled run {}", run_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_ids_are_unique_and_nonempty() {
        let a = RunId::generate();
        let b = RunId::generate();
        assert!(!a.as_str().is_empty());
        assert_ne!(a, b);
    }

    #[test]
    fn terminal_statuses() {
        assert!(RunStatus::Succeeded.is_terminal());
        assert!(RunStatus::Failed.is_terminal());
        for status in [
            RunStatus::Idle,
            RunStatus::Recording,
            RunStatus::Uploading,
            RunStatus::Queued,
            RunStatus::Processing,
        ] {
            assert!(!status.is_terminal(), "{status} must not be terminal");
        }
    }

    #[test]
    fn busy_statuses_block_new_recordings() {
        assert!(!RunStatus::Idle.is_busy());
        assert!(!RunStatus::Succeeded.is_busy());
        assert!(!RunStatus::Failed.is_busy());
        assert!(RunStatus::Recording.is_busy());
        assert!(RunStatus::Queued.is_busy());
        assert!(RunStatus::Processing.is_busy());
    }

    #[test]
    fn status_event_serializes_only_set_fields() {
        let event = StatusEvent::progressed(RunStatus::Processing, 42);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["status"], "processing");
        assert_eq!(json["progress"], 42);
        assert!(json.get("result").is_none());
        assert!(json.get("error").is_none());
    }

    #[test]
    fn status_event_roundtrips_partial_payloads() {
        let event: StatusEvent = serde_json::from_str(r#"{"progress": 7}"#).unwrap();
        assert_eq!(event.progress, Some(7));
        assert_eq!(event.status, None);
        assert!(!event.is_terminal());
    }

    #[test]
    fn succeeded_event_is_terminal_with_payload() {
        let event = StatusEvent::succeeded(AnalysisResult::mock());
        assert!(event.is_terminal());
        assert_eq!(event.progress, Some(100));
        let result = event.result.unwrap();
        assert!(!result.summary.is_empty());
        assert_eq!(result.entities.len(), 2);
        assert_eq!(result.entities[0].kind, "Person");
    }

    #[test]
    fn entity_serializes_with_type_key() {
        let json = serde_json::to_value(AnalysisResult::mock()).unwrap();
        assert_eq!(json["entities"][0]["type"], "Person");
        assert_eq!(json["entities"][0]["value"], "Alice");
    }

    #[test]
    fn sim_config_validation() {
        assert!(SimConfig::default().validate().is_ok());

        let zero_tick = SimConfig {
            tick_interval: Duration::ZERO,
            ..SimConfig::default()
        };
        assert!(zero_tick.validate().is_err());

        let inverted = SimConfig {
            min_step: 30,
            max_step: 5,
            ..SimConfig::default()
        };
        assert!(inverted.validate().is_err());

        let stalls = SimConfig {
            min_step: 0,
            max_step: 0,
            ..SimConfig::default()
        };
        assert!(stalls.validate().is_err());
    }

    #[test]
    fn run_report_omits_missing_run_id() {
        let report = RunReport {
            timestamp_utc: String::new(),
            run_id: None,
            status: RunStatus::Failed,
            progress: 0,
            result: None,
            error: Some("microphone permission denied".to_string()),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("run_id").is_none());
        assert_eq!(json["status"], "failed");
    }
}
