// src/prompts/oauth.rs
// Sign-in prompt with a wall-clock expiry window

//! The sign-in flow itself lives behind the [`TokenProvider`] collaborator;
//! this dialog owns the conversation mechanics: send the sign-in prompt,
//! watch subsequent turns for a token (a token event, a magic code, or a
//! successful provider poll), and give up once the window recorded at begin
//! time has passed. The expiry is a pure value comparison against the
//! inbound activity's timestamp, never a scheduled timer.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::{PromptOptions, OPTIONS_KEY};
use crate::activity::{Activity, ActivityType};
use crate::dialogs::{Dialog, DialogContext, DialogReason, DialogTurnResult};
use crate::error::{PalaverError, Result};
use crate::state::DialogInstance;
use crate::turn::TurnContext;

const EXPIRES_KEY: &str = "expires";

/// Event/invoke name carrying a token back from the channel.
pub const TOKEN_RESPONSE_EVENT: &str = "tokens/response";

/// Six-digit verification codes users paste back after signing in.
#[allow(clippy::expect_used)]
static MAGIC_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{6}$").expect("magic code pattern is valid"));

/// A token handed back by the provider or the channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub connection_name: String,
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration: Option<DateTime<Utc>>,
}

/// OAuth collaborator interface: token lookup and sign-out. Everything
/// about the actual identity service is the implementation's problem.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn get_token(
        &self,
        turn: &mut TurnContext,
        connection_name: &str,
        magic_code: Option<&str>,
    ) -> Result<Option<TokenResponse>>;

    async fn sign_out(&self, turn: &mut TurnContext, connection_name: &str) -> Result<()>;
}

/// Settings for an [`OAuthPrompt`].
#[derive(Debug, Clone)]
pub struct OAuthPromptSettings {
    /// Name of the provider connection to request tokens from.
    pub connection_name: String,
    /// Title of the sign-in prompt.
    pub title: String,
    /// Extra text shown with the sign-in prompt.
    pub text: Option<String>,
    /// How long the user has to finish signing in.
    pub timeout: Duration,
}

impl OAuthPromptSettings {
    pub fn new(connection_name: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            connection_name: connection_name.into(),
            title: title.into(),
            text: None,
            timeout: Duration::minutes(15),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Dialog that prompts the user to sign in and resolves to a
/// [`TokenResponse`], or `None` once the sign-in window expires.
pub struct OAuthPrompt {
    id: String,
    settings: OAuthPromptSettings,
    provider: Arc<dyn TokenProvider>,
}

impl OAuthPrompt {
    pub fn new(
        id: impl Into<String>,
        settings: OAuthPromptSettings,
        provider: Arc<dyn TokenProvider>,
    ) -> Self {
        Self {
            id: id.into(),
            settings,
            provider,
        }
    }

    async fn send_sign_in(&self, turn: &mut TurnContext, options: &PromptOptions) -> Result<()> {
        let activity = options.prompt.clone().unwrap_or_else(|| {
            let text = match &self.settings.text {
                Some(text) => format!("{}: {}", self.settings.title, text),
                None => self.settings.title.clone(),
            };
            Activity::message(text)
        });
        turn.send_activity(activity).await?;
        Ok(())
    }

    /// Pull a token out of the current turn, if there is one to be had.
    async fn recognize_token(&self, turn: &mut TurnContext) -> Result<Option<TokenResponse>> {
        let activity = turn.activity().clone();
        match activity.activity_type {
            ActivityType::Event | ActivityType::Invoke
                if activity.name.as_deref() == Some(TOKEN_RESPONSE_EVENT) =>
            {
                match activity.value {
                    Some(value) => Ok(Some(serde_json::from_value(value)?)),
                    None => Ok(None),
                }
            }
            ActivityType::Message => {
                let text = activity.text_or_empty().trim();
                let magic_code = MAGIC_CODE.is_match(text).then_some(text);
                self.provider
                    .get_token(turn, &self.settings.connection_name, magic_code)
                    .await
            }
            _ => Ok(None),
        }
    }

    fn read_expiry(&self, instance: &DialogInstance) -> Option<DateTime<Utc>> {
        instance
            .state
            .get(EXPIRES_KEY)
            .cloned()
            .and_then(|v| serde_json::from_value(v).ok())
    }

    fn read_options(&self, instance: &DialogInstance) -> PromptOptions {
        instance
            .state
            .get(OPTIONS_KEY)
            .cloned()
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Dialog for OAuthPrompt {
    fn id(&self) -> &str {
        &self.id
    }

    async fn begin_dialog(
        &self,
        dc: &mut DialogContext<'_>,
        options: Option<Value>,
    ) -> Result<DialogTurnResult> {
        let options: PromptOptions = options
            .map(serde_json::from_value)
            .transpose()?
            .unwrap_or_default();

        // A token the provider already holds short-circuits the prompt.
        if let Some(token) = self
            .provider
            .get_token(dc.turn, &self.settings.connection_name, None)
            .await?
        {
            debug!(prompt_id = %self.id, "provider already holds a token");
            return dc.end_dialog(Some(serde_json::to_value(token)?)).await;
        }

        let timestamp = dc.turn.activity().timestamp.unwrap_or_else(Utc::now);
        let expires = timestamp + self.settings.timeout;
        {
            let instance = dc.active_instance_mut().ok_or_else(|| {
                PalaverError::Other(format!("oauth prompt '{}' began without a frame", self.id))
            })?;
            instance
                .state
                .insert(OPTIONS_KEY.to_string(), serde_json::to_value(&options)?);
            instance
                .state
                .insert(EXPIRES_KEY.to_string(), serde_json::to_value(expires)?);
        }
        self.send_sign_in(dc.turn, &options).await?;
        Ok(DialogTurnResult::waiting())
    }

    async fn continue_dialog(&self, dc: &mut DialogContext<'_>) -> Result<DialogTurnResult> {
        let (expires, options) = {
            let instance = dc.active_instance().ok_or_else(|| {
                PalaverError::Other(format!(
                    "oauth prompt '{}' continued without a frame",
                    self.id
                ))
            })?;
            (self.read_expiry(instance), self.read_options(instance))
        };

        // Value comparison only: the inbound activity's clock against the
        // instant recorded at begin time.
        let timestamp = dc.turn.activity().timestamp.unwrap_or_else(Utc::now);
        if let Some(expires) = expires {
            if timestamp > expires {
                debug!(prompt_id = %self.id, "sign-in window expired");
                return dc.end_dialog(None).await;
            }
        }

        if let Some(token) = self.recognize_token(dc.turn).await? {
            return dc.end_dialog(Some(serde_json::to_value(token)?)).await;
        }

        if dc.turn.activity().activity_type == ActivityType::Message && !dc.turn.responded() {
            let retry = options.retry_prompt.clone().unwrap_or_else(|| {
                Activity::message(format!(
                    "{} (still waiting for sign-in)",
                    self.settings.title
                ))
            });
            dc.turn.send_activity(retry).await?;
        }
        Ok(DialogTurnResult::waiting())
    }

    async fn resume_dialog(
        &self,
        dc: &mut DialogContext<'_>,
        _reason: DialogReason,
        _result: Option<Value>,
    ) -> Result<DialogTurnResult> {
        let options = {
            let instance = dc.active_instance().ok_or_else(|| {
                PalaverError::Other(format!("oauth prompt '{}' resumed without a frame", self.id))
            })?;
            self.read_options(instance)
        };
        self.send_sign_in(dc.turn, &options).await?;
        Ok(DialogTurnResult::waiting())
    }

    async fn reprompt_dialog(
        &self,
        turn: &mut TurnContext,
        instance: &mut DialogInstance,
    ) -> Result<()> {
        let options = self.read_options(instance);
        self.send_sign_in(turn, &options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialogs::{DialogRegistry, DialogTurnStatus};
    use crate::state::DialogState;
    use crate::turn::RecordingTransport;
    use std::sync::Mutex;

    /// Provider that releases a token only once a magic code arrives.
    #[derive(Default)]
    struct CodeGatedProvider {
        accepted_code: Mutex<Option<String>>,
    }

    #[async_trait]
    impl TokenProvider for CodeGatedProvider {
        async fn get_token(
            &self,
            _turn: &mut TurnContext,
            connection_name: &str,
            magic_code: Option<&str>,
        ) -> Result<Option<TokenResponse>> {
            if let Some(code) = magic_code {
                if let Ok(mut accepted) = self.accepted_code.lock() {
                    *accepted = Some(code.to_string());
                }
                return Ok(Some(TokenResponse {
                    connection_name: connection_name.to_string(),
                    token: "tok-123".to_string(),
                    expiration: None,
                }));
            }
            Ok(None)
        }

        async fn sign_out(&self, _turn: &mut TurnContext, _connection: &str) -> Result<()> {
            Ok(())
        }
    }

    fn registry(provider: Arc<dyn TokenProvider>) -> DialogRegistry {
        let mut registry = DialogRegistry::new();
        registry
            .add(OAuthPrompt::new(
                "signin",
                OAuthPromptSettings::new("github", "Please sign in"),
                provider,
            ))
            .unwrap();
        registry
    }

    #[tokio::test]
    async fn test_begin_sends_sign_in_and_waits() {
        let transport = Arc::new(RecordingTransport::new());
        let registry = registry(Arc::new(CodeGatedProvider::default()));
        let mut state = DialogState::new();

        let mut turn = TurnContext::new(transport.clone(), Activity::message("hi"));
        let result = registry
            .run_turn(&mut turn, &mut state, "signin")
            .await
            .unwrap();
        assert_eq!(result.status, DialogTurnStatus::Waiting);
        assert_eq!(transport.last_text().as_deref(), Some("Please sign in"));
        assert!(state.stack[0].state.get(EXPIRES_KEY).is_some());
    }

    #[tokio::test]
    async fn test_magic_code_completes_with_token() {
        let provider = Arc::new(CodeGatedProvider::default());
        let registry = registry(provider.clone());
        let mut state = DialogState::new();

        let mut turn = TurnContext::new(Arc::new(RecordingTransport::new()), Activity::message("hi"));
        registry.run_turn(&mut turn, &mut state, "signin").await.unwrap();

        let mut turn = TurnContext::new(
            Arc::new(RecordingTransport::new()),
            Activity::message("123456"),
        );
        let result = registry
            .run_turn(&mut turn, &mut state, "signin")
            .await
            .unwrap();
        assert_eq!(result.status, DialogTurnStatus::Complete);
        let token: TokenResponse = serde_json::from_value(result.result.unwrap()).unwrap();
        assert_eq!(token.token, "tok-123");
        assert_eq!(
            provider.accepted_code.lock().unwrap().as_deref(),
            Some("123456")
        );
    }

    #[tokio::test]
    async fn test_token_event_completes() {
        let registry = registry(Arc::new(CodeGatedProvider::default()));
        let mut state = DialogState::new();

        let mut turn = TurnContext::new(Arc::new(RecordingTransport::new()), Activity::message("hi"));
        registry.run_turn(&mut turn, &mut state, "signin").await.unwrap();

        let token_event = Activity::event(
            TOKEN_RESPONSE_EVENT,
            Some(serde_json::json!({
                "connectionName": "github",
                "token": "tok-evt"
            })),
        );
        let mut turn = TurnContext::new(Arc::new(RecordingTransport::new()), token_event);
        let result = registry
            .run_turn(&mut turn, &mut state, "signin")
            .await
            .unwrap();
        assert_eq!(result.status, DialogTurnStatus::Complete);
        let token: TokenResponse = serde_json::from_value(result.result.unwrap()).unwrap();
        assert_eq!(token.token, "tok-evt");
    }

    #[tokio::test]
    async fn test_expiry_ends_with_no_token() {
        let registry = registry(Arc::new(CodeGatedProvider::default()));
        let mut state = DialogState::new();

        let begin_at = Utc::now();
        let mut turn = TurnContext::new(
            Arc::new(RecordingTransport::new()),
            Activity::message("hi").with_timestamp(begin_at),
        );
        registry.run_turn(&mut turn, &mut state, "signin").await.unwrap();

        // A reply arriving 16 minutes later is past the 15 minute window.
        let late = begin_at + Duration::minutes(16);
        let mut turn = TurnContext::new(
            Arc::new(RecordingTransport::new()),
            Activity::message("sorry, got distracted").with_timestamp(late),
        );
        let result = registry
            .run_turn(&mut turn, &mut state, "signin")
            .await
            .unwrap();
        assert_eq!(result.status, DialogTurnStatus::Complete);
        assert!(result.result.is_none());
        assert!(state.is_empty());
    }

    #[tokio::test]
    async fn test_unrecognized_reply_retries() {
        let transport = Arc::new(RecordingTransport::new());
        let registry = registry(Arc::new(CodeGatedProvider::default()));
        let mut state = DialogState::new();

        let mut turn = TurnContext::new(transport.clone(), Activity::message("hi"));
        registry.run_turn(&mut turn, &mut state, "signin").await.unwrap();

        let mut turn = TurnContext::new(transport.clone(), Activity::message("what?"));
        let result = registry
            .run_turn(&mut turn, &mut state, "signin")
            .await
            .unwrap();
        assert_eq!(result.status, DialogTurnStatus::Waiting);
        assert!(transport
            .last_text()
            .unwrap()
            .contains("still waiting for sign-in"));
    }
}
