//! PipelineApi - file submission and the pipeline event stream.
//!
//! Submission is a multipart POST; progress arrives over a server-push
//! event stream that this client decodes line by line into
//! [`StageEvent`] values on a bounded channel.

use async_trait::async_trait;
use futures::StreamExt;
use plotline_core::pipeline::{
    PipelineService, StageEvent, StageEventReceiver, StreamItem, UploadRequest,
};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::mpsc;

/// Timeout for the multipart submission request.
const SUBMIT_TIMEOUT: Duration = Duration::from_secs(60);
/// Backpressure bound on the decoded event channel.
const STREAM_CHANNEL_CAPACITY: usize = 32;

/// Pipeline API client.
#[derive(Clone)]
pub struct PipelineApi {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitResponse {
    pipeline_session_id: String,
}

impl PipelineApi {
    /// Creates a new PipelineApi.
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            api_key,
        }
    }

    /// Makes an authenticated request to the API.
    fn auth_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(api_key) = &self.api_key {
            request.header("Authorization", format!("Bearer {}", api_key))
        } else {
            request
        }
    }
}

#[async_trait]
impl PipelineService for PipelineApi {
    async fn submit(&self, request: &UploadRequest) -> anyhow::Result<String> {
        let url = format!("{}/pipeline/session", self.base_url);

        let mime = mime_guess::from_path(&request.file_name).first_or_octet_stream();
        let part = Part::bytes(request.bytes.clone())
            .file_name(request.file_name.clone())
            .mime_str(mime.essence_str())?;

        let mut form = Form::new().part("file", part);
        for (key, value) in &request.options {
            form = form.text(key.clone(), value.clone());
        }

        let response = self
            .auth_request(
                self.client
                    .post(&url)
                    .multipart(form)
                    .timeout(SUBMIT_TIMEOUT),
            )
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            anyhow::bail!("Failed to submit upload: {} - {}", status, error_text);
        }

        let submitted: SubmitResponse = response.json().await?;
        tracing::info!(
            "[PipelineApi] Submitted {} as pipeline session {}",
            request.file_name,
            submitted.pipeline_session_id
        );
        Ok(submitted.pipeline_session_id)
    }

    async fn open_stream(&self, pipeline_session_id: &str) -> anyhow::Result<StageEventReceiver> {
        let url = format!(
            "{}/pipeline/session/{}/stream",
            self.base_url, pipeline_session_id
        );

        // No request timeout here: the stream stays open for the whole
        // run and the caller enforces its own deadline.
        let response = self.auth_request(self.client.get(&url)).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            anyhow::bail!("Failed to open event stream: {} - {}", status, error_text);
        }

        tracing::debug!(
            "[PipelineApi] Event stream open for pipeline session {}",
            pipeline_session_id
        );

        let (tx, rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);
        tokio::spawn(read_stream(response, tx));
        Ok(rx)
    }
}

/// Pumps the response body into decoded events.
///
/// Stops on the first channel-level failure, when the server closes
/// the stream, or when the receiver is dropped.
async fn read_stream(response: reqwest::Response, tx: mpsc::Sender<StreamItem>) {
    let mut stream = response.bytes_stream();
    let mut buffer: Vec<u8> = Vec::new();

    while let Some(chunk) = stream.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                let _ = tx
                    .send(StreamItem::Failed(format!("connection lost: {}", e)))
                    .await;
                return;
            }
        };
        // raw bytes: a multi-byte character may straddle two chunks,
        // so decoding waits until a full line is framed
        buffer.extend_from_slice(&chunk);

        while let Some(decoded) = drain_event(&mut buffer) {
            let item = match decoded {
                Ok(event) => StreamItem::Event(event),
                Err(reason) => StreamItem::Failed(reason),
            };
            let stop_after = matches!(item, StreamItem::Failed(_));
            if tx.send(item).await.is_err() {
                // receiver dropped: the run is settled, stop reading
                return;
            }
            if stop_after {
                return;
            }
        }
    }
}

/// Pops the next complete `data:` line off the front of `buffer`.
///
/// Frames are split at newline byte positions before any decoding, so
/// partial characters at the end of `buffer` simply wait for the rest.
/// Comment, event-name, and blank separator lines are discarded.
/// Returns `None` when no complete data line remains; a line that is
/// not valid UTF-8, or a data payload that is not valid JSON, is
/// reported as a failure.
fn drain_event(buffer: &mut Vec<u8>) -> Option<Result<StageEvent, String>> {
    while let Some(newline) = buffer.iter().position(|&b| b == b'\n') {
        let raw: Vec<u8> = buffer.drain(..=newline).collect();
        let line = match std::str::from_utf8(&raw) {
            Ok(line) => line.trim_end_matches(['\n', '\r']),
            Err(e) => return Some(Err(format!("event stream sent invalid UTF-8: {}", e))),
        };

        let Some(payload) = line.strip_prefix("data: ") else {
            continue;
        };
        return Some(
            serde_json::from_str(payload).map_err(|e| format!("malformed event: {}", e)),
        );
    }
    None
}
