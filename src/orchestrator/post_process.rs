//! Post-run processing.
//!
//! Builds the final report from the observed session and handles the
//! optional JSON export once a run reaches a terminal status.

use anyhow::{Context, Result};
use std::path::Path;

use crate::model::{RunId, RunReport};
use crate::session::ConsoleSession;

/// Result of post-run processing, ready for presentation layers.
pub struct ProcessedRun {
    pub report: RunReport,
    pub export_messages: Vec<String>,
}

/// Build the report for a finished session and run any configured exports.
pub fn process_run_completion(
    run_id: Option<&RunId>,
    session: &ConsoleSession,
    export_json: Option<&Path>,
) -> ProcessedRun {
    let report = RunReport {
        timestamp_utc: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_else(|_| "now".into()),
        run_id: run_id.cloned(),
        status: session.status,
        progress: session.progress,
        result: session.result.clone(),
        error: session.error.clone(),
    };

    let mut export_messages = Vec::new();
    if let Some(path) = export_json {
        match export_report(path, &report) {
            Ok(()) => export_messages.push(format!("Exported JSON: {}", path.display())),
            Err(e) => export_messages.push(format!("Export JSON failed: {e:#}")),
        }
    }

    ProcessedRun {
        report,
        export_messages,
    }
}

fn export_report(path: &Path, report: &RunReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("failed to serialize run report")?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write report to {}", path.display()))?;
    Ok(())
}
