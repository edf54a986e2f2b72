use super::stage::StageEvent;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::mpsc;

/// A file upload headed for the analysis pipeline.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub file_name: String,
    pub bytes: Vec<u8>,
    /// Extra form fields forwarded verbatim to the pipeline.
    pub options: HashMap<String, String>,
}

impl UploadRequest {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
            options: HashMap::new(),
        }
    }
}

/// One item delivered over the event channel.
#[derive(Debug, Clone)]
pub enum StreamItem {
    /// A decoded stage event.
    Event(StageEvent),
    /// The channel broke; the payload describes why.
    Failed(String),
}

/// Receiving half of a pipeline event stream.
///
/// Dropping the receiver tells the producer to stop reading.
pub type StageEventReceiver = mpsc::Receiver<StreamItem>;

/// Remote analysis pipeline operations.
#[async_trait]
pub trait PipelineService: Send + Sync {
    /// Submits a file for analysis.
    ///
    /// # Arguments
    /// * `request` - The file and its submission options
    ///
    /// # Returns
    /// The pipeline session id to stream events from.
    async fn submit(&self, request: &UploadRequest) -> anyhow::Result<String>;

    /// Opens the push event stream for a pipeline session.
    ///
    /// The returned channel yields events until a terminal stage, a
    /// stream failure, or the receiver is dropped.
    async fn open_stream(&self, pipeline_session_id: &str) -> anyhow::Result<StageEventReceiver>;
}
