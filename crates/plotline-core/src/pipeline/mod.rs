//! Pipeline domain: stage events, run lifecycle, and the pipeline port.
//!
//! # Module Structure
//!
//! - `stage`: stage vocabulary, progress labels, and event payloads
//! - `machine`: the settle-once `RunStateMachine`
//! - `failure`: `RunFailure` classification and user-facing messages
//! - `service`: the `PipelineService` port implemented by the API client

mod failure;
mod machine;
mod service;
pub mod stage;

pub use failure::RunFailure;
pub use machine::{RunOutcome, RunState, RunStateMachine};
pub use service::{PipelineService, StageEventReceiver, StreamItem, UploadRequest};
pub use stage::{DashboardPayload, IngestionSummary, PipelineResult, StageEvent};
