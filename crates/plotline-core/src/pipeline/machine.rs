//! Run lifecycle state machine.
//!
//! A run settles exactly once: whichever of completion, error stage,
//! channel failure, or timeout fires first produces the outcome, and
//! every later signal is ignored. The machine is purely synchronous;
//! the application layer drives it from the event loop.

use super::failure::RunFailure;
use super::stage::{stage_label, PipelineResult, StageEvent, STAGE_COMPLETE, STAGE_ERROR};

/// Lifecycle phase of one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Submitting,
    Streaming,
    Complete,
    Failed,
}

/// Final outcome of a settled run.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Complete(PipelineResult),
    Failed(RunFailure),
}

/// Tracks one run from submission to its single settled outcome.
#[derive(Debug)]
pub struct RunStateMachine {
    state: RunState,
    pipeline_session_id: Option<String>,
    labels: Vec<String>,
    settled: bool,
}

impl RunStateMachine {
    pub fn new() -> Self {
        Self {
            state: RunState::Idle,
            pipeline_session_id: None,
            labels: Vec::new(),
            settled: false,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn is_settled(&self) -> bool {
        self.settled
    }

    pub fn pipeline_session_id(&self) -> Option<&str> {
        self.pipeline_session_id.as_deref()
    }

    /// Most recent progress label, or empty before the first event.
    pub fn current_label(&self) -> &str {
        self.labels.last().map(String::as_str).unwrap_or("")
    }

    /// All progress labels observed so far, oldest first.
    pub fn label_history(&self) -> &[String] {
        &self.labels
    }

    pub fn begin_submit(&mut self) {
        self.state = RunState::Submitting;
    }

    /// Settles the run when the upload request itself is rejected.
    pub fn submit_failed(&mut self, cause: impl Into<String>) -> Option<RunOutcome> {
        self.settle(RunOutcome::Failed(RunFailure::submit(cause)))
    }

    pub fn begin_streaming(&mut self, pipeline_session_id: impl Into<String>) {
        self.pipeline_session_id = Some(pipeline_session_id.into());
        self.state = RunState::Streaming;
    }

    /// Applies one stream event.
    ///
    /// Returns the outcome when this event settles the run; progress
    /// events and anything after settlement return `None`.
    pub fn on_event(&mut self, event: &StageEvent) -> Option<RunOutcome> {
        if self.settled {
            return None;
        }
        match event.stage.as_str() {
            STAGE_COMPLETE => match &event.result {
                Some(result) => self.settle(RunOutcome::Complete(result.clone())),
                None => self.settle(RunOutcome::Failed(RunFailure::stage(
                    "completion event carried no result",
                ))),
            },
            STAGE_ERROR => {
                let cause = event
                    .message
                    .clone()
                    .unwrap_or_else(|| "pipeline failed".to_string());
                self.settle(RunOutcome::Failed(RunFailure::stage(cause)))
            }
            stage => {
                let label = stage_label(stage);
                if self.labels.last().map(String::as_str) != Some(label) {
                    self.labels.push(label.to_string());
                }
                None
            }
        }
    }

    /// Settles the run when the event stream breaks mid-flight.
    pub fn on_channel_error(&mut self, cause: impl Into<String>) -> Option<RunOutcome> {
        self.settle(RunOutcome::Failed(RunFailure::channel(cause)))
    }

    /// Settles the run when the streaming deadline elapses.
    pub fn on_timeout(&mut self) -> Option<RunOutcome> {
        self.settle(RunOutcome::Failed(RunFailure::Timeout))
    }

    fn settle(&mut self, outcome: RunOutcome) -> Option<RunOutcome> {
        if self.settled {
            return None;
        }
        self.settled = true;
        self.state = match outcome {
            RunOutcome::Complete(_) => RunState::Complete,
            RunOutcome::Failed(_) => RunState::Failed,
        };
        Some(outcome)
    }
}

impl Default for RunStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::stage::IngestionSummary;

    fn completion_event() -> StageEvent {
        StageEvent {
            stage: STAGE_COMPLETE.to_string(),
            chart: None,
            result: Some(PipelineResult {
                ingestion: IngestionSummary {
                    dataset_id: "d1".to_string(),
                    dataset_name: "sales.csv".to_string(),
                    row_count: 10,
                },
                dashboard: None,
            }),
            message: None,
        }
    }

    #[test]
    fn test_progress_events_do_not_settle() {
        let mut machine = RunStateMachine::new();
        machine.begin_streaming("p1");

        assert!(machine.on_event(&StageEvent::stage_only("reading_csv")).is_none());
        assert!(!machine.is_settled());
        assert_eq!(machine.current_label(), "Reading your data");
    }

    #[test]
    fn test_completion_settles_with_result() {
        let mut machine = RunStateMachine::new();
        machine.begin_streaming("p1");

        let outcome = machine.on_event(&completion_event());
        match outcome {
            Some(RunOutcome::Complete(result)) => {
                assert_eq!(result.ingestion.dataset_id, "d1")
            }
            other => panic!("expected completion, got {:?}", other),
        }
        assert_eq!(machine.state(), RunState::Complete);
    }

    #[test]
    fn test_completion_without_result_fails_the_run() {
        let mut machine = RunStateMachine::new();
        machine.begin_streaming("p1");

        let outcome = machine.on_event(&StageEvent::stage_only(STAGE_COMPLETE));
        assert!(matches!(
            outcome,
            Some(RunOutcome::Failed(RunFailure::Stage { .. }))
        ));
    }

    #[test]
    fn test_error_stage_carries_the_server_message() {
        let mut machine = RunStateMachine::new();
        machine.begin_streaming("p1");

        let mut event = StageEvent::stage_only(STAGE_ERROR);
        event.message = Some("unsupported encoding".to_string());
        let outcome = machine.on_event(&event);
        assert_eq!(
            outcome,
            Some(RunOutcome::Failed(RunFailure::stage("unsupported encoding")))
        );
    }

    #[test]
    fn test_settles_exactly_once() {
        let mut machine = RunStateMachine::new();
        machine.begin_streaming("p1");

        assert!(machine.on_event(&completion_event()).is_some());
        // late signals of every flavor are swallowed
        assert!(machine.on_event(&completion_event()).is_none());
        assert!(machine.on_event(&StageEvent::stage_only(STAGE_ERROR)).is_none());
        assert!(machine.on_channel_error("reset").is_none());
        assert!(machine.on_timeout().is_none());
        assert_eq!(machine.state(), RunState::Complete);
    }

    #[test]
    fn test_timeout_loses_to_an_earlier_error() {
        let mut machine = RunStateMachine::new();
        machine.begin_streaming("p1");

        assert!(machine.on_channel_error("connection reset").is_some());
        assert!(machine.on_timeout().is_none());
        assert_eq!(machine.state(), RunState::Failed);
    }

    #[test]
    fn test_label_history_preserves_order_and_collapses_repeats() {
        let mut machine = RunStateMachine::new();
        machine.begin_streaming("p1");

        for stage in ["upload_received", "reading_csv", "reading_csv", "analysis"] {
            machine.on_event(&StageEvent::stage_only(stage));
        }
        assert_eq!(
            machine.label_history(),
            &[
                "Upload received".to_string(),
                "Reading your data".to_string(),
                "Running analysis".to_string(),
            ]
        );
    }

    #[test]
    fn test_submit_failure_settles_before_streaming() {
        let mut machine = RunStateMachine::new();
        machine.begin_submit();

        let outcome = machine.submit_failed("413 payload too large");
        assert!(matches!(
            outcome,
            Some(RunOutcome::Failed(RunFailure::Submit { .. }))
        ));
        assert!(machine.pipeline_session_id().is_none());
    }
}
