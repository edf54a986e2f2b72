//! Drives one pipeline run from submission to its settled outcome.
//!
//! The runner turns the push event stream into a single awaited value:
//! it submits the upload, opens the stream, feeds events through the
//! run state machine, and enforces the streaming deadline. Exactly one
//! of completion, error stage, channel failure, or timeout decides the
//! result; whichever fires first wins and the rest are ignored.

use plotline_core::dashboard::Panel;
use plotline_core::pipeline::{
    PipelineService, RunFailure, RunOutcome, RunStateMachine, StreamItem, UploadRequest,
};
use std::sync::Arc;
use std::time::Duration;

/// Wall-clock limit for the streaming phase of one run.
pub const DEFAULT_STREAM_TIMEOUT: Duration = Duration::from_secs(300);

/// Receives progress callbacks while a run is streaming.
///
/// Callbacks run on the event loop, so implementations must be cheap.
pub trait RunObserver: Send + Sync {
    /// A progress stage arrived; `label` is ready for display.
    fn on_stage(&self, stage: &str, label: &str) {
        let _ = (stage, label);
    }

    /// A finished chart fragment arrived before completion.
    fn on_chart(&self, panel: &Panel) {
        let _ = panel;
    }
}

/// Observer that ignores every callback.
pub struct NullObserver;

impl RunObserver for NullObserver {}

/// Executes pipeline runs against an injected [`PipelineService`].
pub struct PipelineRunner {
    pipeline: Arc<dyn PipelineService>,
    stream_timeout: Duration,
}

impl PipelineRunner {
    pub fn new(pipeline: Arc<dyn PipelineService>) -> Self {
        Self::with_timeout(pipeline, DEFAULT_STREAM_TIMEOUT)
    }

    pub fn with_timeout(pipeline: Arc<dyn PipelineService>, stream_timeout: Duration) -> Self {
        Self {
            pipeline,
            stream_timeout,
        }
    }

    /// Runs one upload to its settled outcome.
    ///
    /// There is no retry within a run: a dropped stream is terminal,
    /// and the caller decides whether to start a brand-new run by
    /// resubmitting the file.
    pub async fn execute(&self, request: &UploadRequest, observer: &dyn RunObserver) -> RunOutcome {
        let mut machine = RunStateMachine::new();

        machine.begin_submit();
        let pipeline_session_id = match self.pipeline.submit(request).await {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!("[PipelineRunner] Submission failed: {}", e);
                return match machine.submit_failed(e.to_string()) {
                    Some(outcome) => outcome,
                    None => RunOutcome::Failed(RunFailure::submit(e.to_string())),
                };
            }
        };

        machine.begin_streaming(&pipeline_session_id);

        // one deadline covers the whole streaming phase, the stream
        // open included: a server that accepts the request but never
        // responds must not park the run forever
        let deadline = tokio::time::sleep(self.stream_timeout);
        tokio::pin!(deadline);

        let opened = tokio::select! {
            opened = self.pipeline.open_stream(&pipeline_session_id) => opened,
            _ = &mut deadline => {
                tracing::warn!(
                    "[PipelineRunner] Run {} exceeded {:?} before the event stream opened",
                    pipeline_session_id,
                    self.stream_timeout
                );
                return match machine.on_timeout() {
                    Some(outcome) => outcome,
                    None => RunOutcome::Failed(RunFailure::Timeout),
                };
            }
        };
        let mut events = match opened {
            Ok(events) => events,
            Err(e) => {
                tracing::warn!("[PipelineRunner] Could not open event stream: {}", e);
                return match machine.on_channel_error(e.to_string()) {
                    Some(outcome) => outcome,
                    None => RunOutcome::Failed(RunFailure::channel(e.to_string())),
                };
            }
        };

        let outcome = loop {
            tokio::select! {
                _ = &mut deadline => {
                    tracing::warn!(
                        "[PipelineRunner] Run {} exceeded {:?}",
                        pipeline_session_id,
                        self.stream_timeout
                    );
                    break match machine.on_timeout() {
                        Some(outcome) => outcome,
                        None => RunOutcome::Failed(RunFailure::Timeout),
                    };
                }
                item = events.recv() => match item {
                    Some(StreamItem::Event(event)) => {
                        if let Some(outcome) = machine.on_event(&event) {
                            break outcome;
                        }
                        if let Some(chart) = &event.chart {
                            observer.on_chart(chart);
                        }
                        observer.on_stage(&event.stage, machine.current_label());
                    }
                    Some(StreamItem::Failed(cause)) => {
                        break match machine.on_channel_error(cause.clone()) {
                            Some(outcome) => outcome,
                            None => RunOutcome::Failed(RunFailure::channel(cause)),
                        };
                    }
                    None => {
                        break match machine.on_channel_error("event stream closed before completion") {
                            Some(outcome) => outcome,
                            None => RunOutcome::Failed(RunFailure::channel(
                                "event stream closed before completion",
                            )),
                        };
                    }
                },
            }
        };

        // dropping the receiver stops the reader; late events go nowhere
        drop(events);

        match &outcome {
            RunOutcome::Complete(result) => tracing::info!(
                "[PipelineRunner] Run {} complete for dataset {}",
                pipeline_session_id,
                result.ingestion.dataset_id
            ),
            RunOutcome::Failed(failure) => tracing::warn!(
                "[PipelineRunner] Run {} failed: {}",
                pipeline_session_id,
                failure
            ),
        }
        outcome
    }
}
