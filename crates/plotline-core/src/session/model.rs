//! Session and message domain models.
//!
//! This module contains the core `Session` entity representing one
//! logical conversation, and the `Message` transcript entry.

use crate::dashboard::Panel;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Metadata key carrying the arranged dashboard payload.
const META_DASHBOARD: &str = "dashboard";
/// Metadata flag marking a message as the dashboard reveal point.
const META_HAS_DASHBOARD: &str = "has_dashboard";

/// Represents the sender of a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Message typed by the user.
    User,
    /// Message produced by the assistant, including pipeline notices.
    Assistant,
    /// Chart-only message carrying a single panel.
    Chart,
}

/// Controls whether an appended message is durably persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageDurability {
    /// Persist to the remote transcript with bounded retry.
    Durable,
    /// Keep in memory only; used for transient system notices.
    Transient,
}

/// Opaque per-message metadata map.
///
/// May carry a dashboard payload and the reveal flag; any other entries
/// are passed through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageMetadata(pub HashMap<String, serde_json::Value>);

impl MessageMetadata {
    /// Attaches a dashboard payload and sets the reveal flag.
    pub fn set_dashboard(&mut self, payload: serde_json::Value) {
        self.0.insert(META_DASHBOARD.to_string(), payload);
        self.0
            .insert(META_HAS_DASHBOARD.to_string(), serde_json::Value::Bool(true));
    }

    /// The dashboard payload, if this message carries one.
    pub fn dashboard(&self) -> Option<&serde_json::Value> {
        self.0.get(META_DASHBOARD)
    }

    /// True iff this message is the dashboard reveal point.
    pub fn has_dashboard(&self) -> bool {
        self.0
            .get(META_HAS_DASHBOARD)
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }
}

/// One transcript entry. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Client-generated unique id (UUID v4).
    pub id: String,
    /// The role of the message sender.
    pub role: MessageRole,
    /// Text body; absent for chart-only messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Display timestamp, already formatted for the transcript.
    pub timestamp: String,
    /// Chart payload for chart-only messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart: Option<Panel>,
    #[serde(default)]
    pub metadata: MessageMetadata,
    #[serde(default)]
    pub show_dashboard_button: bool,
}

impl Message {
    fn stamped(role: MessageRole, content: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content,
            timestamp: chrono::Local::now().format("%H:%M").to_string(),
            chart: None,
            metadata: MessageMetadata::default(),
            show_dashboard_button: false,
        }
    }

    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::stamped(MessageRole::User, Some(content.into()))
    }

    /// Creates an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::stamped(MessageRole::Assistant, Some(content.into()))
    }

    /// Creates a chart-only message.
    pub fn chart(panel: Panel) -> Self {
        let mut message = Self::stamped(MessageRole::Chart, None);
        message.chart = Some(panel);
        message
    }
}

/// Represents one logical conversation.
///
/// Exactly one session is active in memory at a time; ownership is
/// exclusive to the authenticated user matching `owner_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Server-issued opaque identifier.
    pub id: String,
    /// Identity of the authenticated user who created the session.
    pub owner_id: String,
    /// Human-readable session title.
    #[serde(default = "default_title")]
    pub title: String,
    /// Transcript in insertion order.
    #[serde(default)]
    pub messages: Vec<Message>,
}

fn default_title() -> String {
    "New conversation".to_string()
}

impl Session {
    pub fn new(id: impl Into<String>, owner_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            owner_id: owner_id.into(),
            title: default_title(),
            messages: Vec::new(),
        }
    }

    /// True iff any message carries the dashboard reveal marker.
    pub fn has_dashboard(&self) -> bool {
        self.messages.iter().any(|m| m.metadata.has_dashboard())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_reveal_flag() {
        let mut metadata = MessageMetadata::default();
        assert!(!metadata.has_dashboard());

        metadata.set_dashboard(serde_json::json!({"charts": []}));
        assert!(metadata.has_dashboard());
        assert!(metadata.dashboard().is_some());
    }

    #[test]
    fn test_session_dashboard_flag_is_derived() {
        let mut session = Session::new("s1", "u1");
        session.messages.push(Message::user("hello"));
        assert!(!session.has_dashboard());

        let mut summary = Message::assistant("done");
        summary.metadata.set_dashboard(serde_json::json!({}));
        session.messages.push(summary);
        assert!(session.has_dashboard());
    }

    #[test]
    fn test_message_wire_names_are_camel_case() {
        let message = Message::user("hi");
        let value = serde_json::to_value(&message).unwrap();
        assert!(value.get("showDashboardButton").is_some());
        assert_eq!(value["role"], "user");
    }

    #[test]
    fn test_chart_message_has_no_content() {
        use crate::dashboard::{Panel, PanelKind};

        let message = Message::chart(Panel::new("c1", PanelKind::Bar, "Revenue"));
        assert_eq!(message.role, MessageRole::Chart);
        assert!(message.content.is_none());
        assert!(message.chart.is_some());
    }
}
