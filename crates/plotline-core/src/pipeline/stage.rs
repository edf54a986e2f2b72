//! Pipeline stage vocabulary and progress events.

use crate::dashboard::Panel;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Terminal stage signalling a successful run.
pub const STAGE_COMPLETE: &str = "pipeline_complete";
/// Terminal stage signalling a failed run.
pub const STAGE_ERROR: &str = "error";
/// Progress label shown for stages this client does not know.
pub const FALLBACK_STAGE_LABEL: &str = "Working on your data";

static STAGE_LABELS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("upload_received", "Upload received"),
        ("reading_csv", "Reading your data"),
        ("ingestion_complete", "Data ingested"),
        ("profiling", "Profiling columns"),
        ("analysis", "Running analysis"),
        ("chart_ready", "Building charts"),
        ("summary_ready", "Summarizing findings"),
        (STAGE_COMPLETE, "Analysis complete"),
    ])
});

/// Human-readable progress label for a raw stage name.
///
/// Unknown stages fall back to a generic label so a server that adds
/// stages does not break older clients.
pub fn stage_label(stage: &str) -> &'static str {
    STAGE_LABELS
        .get(stage)
        .copied()
        .unwrap_or(FALLBACK_STAGE_LABEL)
}

/// True iff the stage ends the run, successfully or not.
pub fn is_terminal_stage(stage: &str) -> bool {
    stage == STAGE_COMPLETE || stage == STAGE_ERROR
}

/// One progress event pushed by the pipeline stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageEvent {
    /// Raw stage name as sent by the server.
    pub stage: String,
    /// Chart fragment streamed mid-run, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart: Option<Panel>,
    /// Full result payload; present only on the completion event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<PipelineResult>,
    /// Server-supplied detail, set on error events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StageEvent {
    pub fn stage_only(stage: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            chart: None,
            result: None,
            message: None,
        }
    }
}

/// Authoritative result carried by the completion event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineResult {
    pub ingestion: IngestionSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dashboard: Option<DashboardPayload>,
}

/// What the pipeline learned about the uploaded dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionSummary {
    pub dataset_id: String,
    pub dataset_name: String,
    #[serde(default)]
    pub row_count: u64,
}

/// Unplaced dashboard panels produced by the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardPayload {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub charts: Vec<Panel>,
}
