// src/activity.rs
// Inbound/outbound turn data shared with the transport layer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Locale assumed when an inbound activity carries none.
pub const DEFAULT_LOCALE: &str = "en-us";

/// Kind of activity flowing through a turn. Only `Message` drives
/// recognition; other types leave dialogs waiting unless a dialog
/// handles them explicitly (e.g. token events for OAuth).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum ActivityType {
    Message,
    Event,
    Invoke,
    ConversationUpdate,
    EndOfConversation,
}

/// One unit of communication between user and bot.
///
/// This is the engine's view of what the transport delivers and what the
/// engine hands back for delivery. Wire formats are the transport's problem.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    /// Name of an event/invoke activity (e.g. "tokens/response").
    #[serde(default)]
    pub name: Option<String>,
    /// Payload of an event/invoke activity.
    #[serde(default)]
    pub value: Option<Value>,
}

impl Activity {
    /// Build a message activity carrying the given text.
    pub fn message(text: impl Into<String>) -> Self {
        Self {
            id: Some(Uuid::new_v4().to_string()),
            activity_type: ActivityType::Message,
            text: Some(text.into()),
            locale: None,
            timestamp: Some(Utc::now()),
            name: None,
            value: None,
        }
    }

    /// Build a named event activity with an optional payload.
    pub fn event(name: impl Into<String>, value: Option<Value>) -> Self {
        Self {
            id: Some(Uuid::new_v4().to_string()),
            activity_type: ActivityType::Event,
            text: None,
            locale: None,
            timestamp: Some(Utc::now()),
            name: Some(name.into()),
            value,
        }
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Message text, empty string if absent.
    pub fn text_or_empty(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }
}

/// Receipt returned by the transport for a delivered activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceResponse {
    pub id: String,
}

impl ResourceResponse {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
        }
    }
}

impl Default for ResourceResponse {
    fn default() -> Self {
        Self::new()
    }
}
