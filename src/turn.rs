// src/turn.rs
// Turn context and the outbound transport boundary

//! The engine never talks to a channel directly. A [`Transport`] delivers
//! outbound activities; [`TurnContext`] wraps one inbound activity together
//! with that transport for the duration of a single turn and tracks whether
//! anything has been sent yet (the `responded` flag prompts consult before
//! re-prompting).

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::debug;

use crate::activity::{Activity, ResourceResponse, DEFAULT_LOCALE};
use crate::error::Result;

/// Outbound delivery collaborator. Implementations own the wire format,
/// retries, and everything else channel-specific.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_activity(&self, activity: &Activity) -> Result<ResourceResponse>;
}

/// Context for one inbound-message/outbound-response cycle.
///
/// One logical conversation is processed strictly serially; the engine takes
/// `&mut TurnContext` and performs no internal locking.
pub struct TurnContext {
    transport: Arc<dyn Transport>,
    activity: Activity,
    responded: bool,
}

impl TurnContext {
    pub fn new(transport: Arc<dyn Transport>, activity: Activity) -> Self {
        Self {
            transport,
            activity,
            responded: false,
        }
    }

    /// The inbound activity driving this turn.
    pub fn activity(&self) -> &Activity {
        &self.activity
    }

    /// Whether any activity has been sent during this turn.
    pub fn responded(&self) -> bool {
        self.responded
    }

    /// Locale of the inbound activity, falling back to [`DEFAULT_LOCALE`].
    pub fn locale(&self) -> &str {
        self.activity.locale.as_deref().unwrap_or(DEFAULT_LOCALE)
    }

    /// Deliver an outbound activity through the transport and mark the turn
    /// as responded.
    pub async fn send_activity(&mut self, activity: Activity) -> Result<ResourceResponse> {
        debug!(text = ?activity.text, "sending activity");
        let response = self.transport.send_activity(&activity).await?;
        self.responded = true;
        Ok(response)
    }

    /// Convenience wrapper sending a plain text message.
    pub async fn send_text(&mut self, text: impl Into<String>) -> Result<ResourceResponse> {
        self.send_activity(Activity::message(text)).await
    }
}

/// Transport that records everything sent through it instead of delivering.
///
/// Used by the test suites; also handy for hosts that want a dry-run pass
/// over a conversation.
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<Activity>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything sent so far, in order.
    pub fn sent(&self) -> Vec<Activity> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Text of the last sent activity, if any.
    pub fn last_text(&self) -> Option<String> {
        self.sent
            .lock()
            .ok()
            .and_then(|s| s.last().and_then(|a| a.text.clone()))
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().map(|s| s.len()).unwrap_or(0)
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send_activity(&self, activity: &Activity) -> Result<ResourceResponse> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(activity.clone());
        }
        Ok(ResourceResponse::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_responded_flag_starts_false() {
        let transport = Arc::new(RecordingTransport::new());
        let ctx = TurnContext::new(transport, Activity::message("hi"));
        assert!(!ctx.responded());
    }

    #[tokio::test]
    async fn test_send_activity_sets_responded() {
        let transport = Arc::new(RecordingTransport::new());
        let mut ctx = TurnContext::new(transport.clone(), Activity::message("hi"));
        ctx.send_text("hello back").await.unwrap();
        assert!(ctx.responded());
        assert_eq!(transport.sent_count(), 1);
        assert_eq!(transport.last_text().as_deref(), Some("hello back"));
    }

    #[tokio::test]
    async fn test_locale_fallback() {
        let transport = Arc::new(RecordingTransport::new());
        let ctx = TurnContext::new(transport.clone(), Activity::message("hi"));
        assert_eq!(ctx.locale(), DEFAULT_LOCALE);

        let ctx = TurnContext::new(transport, Activity::message("hola").with_locale("es-es"));
        assert_eq!(ctx.locale(), "es-es");
    }
}
