//! Text summary builder for CLI output.
//!
//! Formats the final run report into human-readable lines for text mode.

use crate::model::RunReport;

/// Pre-formatted lines for text output.
pub struct TextSummary {
    pub lines: Vec<String>,
}

/// Build a text summary from the final run report.
pub fn build_text_summary(report: &RunReport) -> TextSummary {
    let mut lines = Vec::new();

    if let Some(run_id) = report.run_id.as_ref() {
        lines.push(format!("Run:      {}", run_id));
    }
    lines.push(format!("Status:   {}", report.status.label()));
    lines.push(format!("Progress: {}%", report.progress));

    if let Some(result) = report.result.as_ref() {
        lines.push(format!("Summary:  {}", result.summary));
        if !result.entities.is_empty() {
            lines.push("Entities:".to_string());
            for entity in &result.entities {
                lines.push(format!("  {}: {}", entity.kind, entity.value));
            }
        }
        if !result.notes.is_empty() {
            lines.push("Notes:".to_string());
            for note in result.notes.lines() {
                lines.push(format!("  {}", note));
            }
        }
    }

    if let Some(error) = report.error.as_deref() {
        lines.push(format!("Error:    {}", error));
    }

    TextSummary { lines }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnalysisResult, RunId, RunReport, RunStatus};

    fn succeeded_report() -> RunReport {
        RunReport {
            timestamp_utc: String::new(),
            run_id: Some(RunId::generate()),
            status: RunStatus::Succeeded,
            progress: 100,
            result: Some(AnalysisResult::mock()),
            error: None,
        }
    }

    #[test]
    fn succeeded_summary_lists_result_fields() {
        let summary = build_text_summary(&succeeded_report());
        let text = summary.lines.join("\n");
        assert!(text.contains("Status:   Completed"));
        assert!(text.contains("Progress: 100%"));
        assert!(text.contains("Person: Alice"));
        assert!(text.contains("- Key Insight 1"));
        assert!(!text.contains("Error:"));
    }

    #[test]
    fn failed_summary_shows_error_and_no_result() {
        let report = RunReport {
            timestamp_utc: String::new(),
            run_id: None,
            status: RunStatus::Failed,
            progress: 0,
            result: None,
            error: Some("microphone permission denied".to_string()),
        };
        let summary = build_text_summary(&report);
        let text = summary.lines.join("\n");
        assert!(text.contains("Status:   Failed"));
        assert!(text.contains("Error:    microphone permission denied"));
        assert!(!text.contains("Run:"));
        assert!(!text.contains("Summary:"));
    }

    #[test]
    fn notes_are_split_into_indented_lines() {
        let summary = build_text_summary(&succeeded_report());
        assert!(summary
            .lines
            .iter()
            .any(|line| line == "  - Key Insight 2"));
    }
}
