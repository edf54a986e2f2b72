//! SessionApi - conversation transcript operations over HTTP.
//!
//! Thin client for the session endpoints: create, message fetch and
//! append, and title updates.

use async_trait::async_trait;
use plotline_core::session::{Message, SessionService};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Per-request timeout for transcript operations.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Session API client.
#[derive(Clone)]
pub struct SessionApi {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    request_timeout: Duration,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateSessionRequest {
    owner_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateSessionResponse {
    session_id: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct UpdateTitleRequest {
    title: String,
}

impl SessionApi {
    /// Creates a new SessionApi with the default request timeout.
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self::with_timeout(base_url, api_key, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Creates a new SessionApi with an explicit request timeout.
    pub fn with_timeout(
        base_url: impl Into<String>,
        api_key: Option<String>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            api_key,
            request_timeout,
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
impl SessionService for SessionApi {
    async fn create_session(&self, owner_id: &str) -> anyhow::Result<String> {
        let url = format!("{}/sessions", self.base_url);
        let request_body = CreateSessionRequest {
            owner_id: owner_id.to_string(),
        };

        let response = self
            .auth_request(
                self.client
                    .post(&url)
                    .json(&request_body)
                    .timeout(self.request_timeout),
            )
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            anyhow::bail!("Failed to create session: {} - {}", status, error_text);
        }

        let created: CreateSessionResponse = response.json().await?;
        tracing::debug!("[SessionApi] Created session {}", created.session_id);
        Ok(created.session_id)
    }

    async fn fetch_messages(&self, session_id: &str) -> anyhow::Result<Vec<Message>> {
        let url = format!("{}/sessions/{}/messages", self.base_url, session_id);

        let response = self
            .auth_request(self.client.get(&url).timeout(self.request_timeout))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            anyhow::bail!("Failed to fetch messages: {} - {}", status, error_text);
        }

        let body: MessagesResponse = response.json().await?;
        tracing::debug!(
            "[SessionApi] Fetched {} messages for session {}",
            body.messages.len(),
            session_id
        );
        Ok(body.messages)
    }

    async fn append_message(&self, session_id: &str, message: &Message) -> anyhow::Result<()> {
        let url = format!("{}/sessions/{}/messages", self.base_url, session_id);

        let response = self
            .auth_request(
                self.client
                    .post(&url)
                    .json(message)
                    .timeout(self.request_timeout),
            )
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            anyhow::bail!("Failed to append message: {} - {}", status, error_text);
        }

        Ok(())
    }

    async fn update_title(&self, session_id: &str, title: &str) -> anyhow::Result<()> {
        let url = format!("{}/sessions/{}/title", self.base_url, session_id);
        let request_body = UpdateTitleRequest {
            title: title.to_string(),
        };

        let response = self
            .auth_request(
                self.client
                    .patch(&url)
                    .json(&request_body)
                    .timeout(self.request_timeout),
            )
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            anyhow::bail!("Failed to update title: {} - {}", status, error_text);
        }

        Ok(())
    }
}
