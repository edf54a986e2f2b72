//! Turns a settled pipeline run into conversation messages.
//!
//! Success produces a durable assistant summary carrying the arranged
//! dashboard; failure produces a single transient assistant notice.
//! Either way the caller gets exactly one message back per upload.

use crate::pipeline_runner::{PipelineRunner, RunObserver};
use crate::session_usecase::SessionUseCase;
use plotline_core::dashboard::arrange;
use plotline_core::pipeline::{DashboardPayload, PipelineResult, RunOutcome, UploadRequest};
use plotline_core::session::{Message, MessageDurability};
use plotline_core::state::{keys, StateStore};
use std::sync::Arc;

/// Runs uploads end to end: pipeline execution, dashboard layout, and
/// conversation bookkeeping.
pub struct UploadUseCase {
    runner: PipelineRunner,
    sessions: Arc<SessionUseCase>,
    store: Arc<dyn StateStore>,
}

impl UploadUseCase {
    pub fn new(
        runner: PipelineRunner,
        sessions: Arc<SessionUseCase>,
        store: Arc<dyn StateStore>,
    ) -> Self {
        Self {
            runner,
            sessions,
            store,
        }
    }

    /// Submits a file and appends the outcome to the active conversation.
    ///
    /// Returns the appended message so the caller can render it without
    /// re-reading the transcript.
    ///
    /// # Errors
    ///
    /// Fails if no session is active. Pipeline failures do NOT error:
    /// they settle into a transient assistant notice.
    pub async fn handle_upload(
        &self,
        request: &UploadRequest,
        observer: &dyn RunObserver,
    ) -> anyhow::Result<Message> {
        if self.sessions.active_session_id().await.is_none() {
            anyhow::bail!("No active session; resume or create one before uploading");
        }

        tracing::info!("[UploadUseCase] Submitting {} for analysis", request.file_name);
        let (message, durability) = match self.runner.execute(request, observer).await {
            RunOutcome::Complete(result) => {
                self.remember_dataset(&result).await;
                (self.completion_message(&result), MessageDurability::Durable)
            }
            RunOutcome::Failed(failure) => (
                Message::assistant(failure.user_message()),
                MessageDurability::Transient,
            ),
        };

        self.sessions
            .append_message(message.clone(), durability)
            .await?;
        Ok(message)
    }

    /// Caches the ingested dataset identity for later turns. Best
    /// effort: a cache miss only costs a lookup next time.
    async fn remember_dataset(&self, result: &PipelineResult) {
        let ingestion = &result.ingestion;
        let pairs = [
            (keys::DATASET_ID, ingestion.dataset_id.as_str()),
            (keys::DATASET_NAME, ingestion.dataset_name.as_str()),
        ];
        for (key, value) in pairs {
            if let Err(e) = self.store.put(key, serde_json::json!(value)).await {
                tracing::warn!("[UploadUseCase] Could not cache {}: {}", key, e);
            }
        }
    }

    fn completion_message(&self, result: &PipelineResult) -> Message {
        let ingestion = &result.ingestion;
        let mut text = format!(
            "Finished analyzing {} ({} rows).",
            ingestion.dataset_name, ingestion.row_count
        );

        // an empty dashboard renders nothing, so treat it as absent
        let dashboard = result
            .dashboard
            .as_ref()
            .filter(|payload| !payload.charts.is_empty());

        let Some(dashboard) = dashboard else {
            return Message::assistant(text);
        };

        text.push_str(" Your dashboard is ready.");
        let mut message = Message::assistant(text);

        let arranged = DashboardPayload {
            title: dashboard.title.clone(),
            charts: arrange(&dashboard.charts),
        };
        match serde_json::to_value(&arranged) {
            Ok(payload) => {
                message.metadata.set_dashboard(payload);
                message.show_dashboard_button = true;
            }
            Err(e) => {
                tracing::warn!("[UploadUseCase] Could not encode dashboard payload: {}", e);
            }
        }
        message
    }
}
