// src/prompts/mod.rs
// Prompt dialogs: send, recognize, validate, retry

//! A prompt is a dialog that elicits one piece of input: it sends a
//! rendered prompt, recognizes the next reply through a pluggable
//! per-variant strategy, optionally runs a user-supplied validator, and
//! either ends with the value or re-prompts. There is no built-in retry
//! limit; the attempt count is exposed to validators so hosts can impose
//! one.

pub mod choice;
pub mod confirm;
pub mod number;
pub mod oauth;
pub mod render;
pub mod text;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

pub use choice::ChoiceRecognizer;
pub use confirm::ConfirmRecognizer;
pub use number::NumberRecognizer;
pub use oauth::{OAuthPrompt, OAuthPromptSettings, TokenProvider, TokenResponse};
pub use render::ListStyle;
pub use text::TextRecognizer;

use crate::activity::{Activity, ActivityType, DEFAULT_LOCALE};
use crate::dialogs::{Dialog, DialogContext, DialogReason, DialogTurnResult};
use crate::error::{PalaverError, Result};
use crate::recognizers::Choice;
use crate::state::{DialogInstance, StateMap};
use crate::turn::TurnContext;

pub(crate) const OPTIONS_KEY: &str = "options";
pub(crate) const STATE_KEY: &str = "state";
pub(crate) const ATTEMPT_COUNT_KEY: &str = "attemptCount";

/// Configuration surface for starting a prompt.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PromptOptions {
    /// Initial prompt to send.
    pub prompt: Option<Activity>,
    /// Prompt to send on retry; falls back to `prompt` when absent.
    pub retry_prompt: Option<Activity>,
    /// Choices offered by list-driven prompts.
    pub choices: Vec<Choice>,
    /// Opaque validator-specific configuration.
    pub validations: Option<Value>,
    /// How list-driven prompts render their choices.
    pub style: ListStyle,
}

impl PromptOptions {
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            prompt: Some(Activity::message(text)),
            ..Default::default()
        }
    }

    pub fn retry_text(mut self, text: impl Into<String>) -> Self {
        self.retry_prompt = Some(Activity::message(text));
        self
    }

    pub fn choices<C: Into<Choice>>(mut self, choices: impl IntoIterator<Item = C>) -> Self {
        self.choices = choices.into_iter().map(Into::into).collect();
        self
    }
}

/// Outcome of a recognition attempt. A failed recognition is normal
/// control flow (it drives the retry path), never an error.
#[derive(Debug, Clone)]
pub struct PromptRecognition<T> {
    pub succeeded: bool,
    pub value: Option<T>,
}

impl<T> PromptRecognition<T> {
    pub fn success(value: T) -> Self {
        Self {
            succeeded: true,
            value: Some(value),
        }
    }

    pub fn failure() -> Self {
        Self {
            succeeded: false,
            value: None,
        }
    }
}

/// Per-variant recognition strategy injected into [`Prompt`].
#[async_trait]
pub trait PromptRecognizer: Send + Sync {
    /// What a successful recognition produces.
    type Value: Serialize + Send + Sync;

    /// Interpret the current turn's reply.
    async fn recognize(
        &self,
        turn: &mut TurnContext,
        state: &mut StateMap,
        options: &PromptOptions,
    ) -> Result<PromptRecognition<Self::Value>>;

    /// Locale to assume when the inbound activity carries none.
    fn default_locale(&self) -> Option<&str> {
        None
    }

    /// Render the outbound prompt activity. The default picks
    /// `retry_prompt` (falling back to `prompt`) on retries and `prompt`
    /// otherwise; list-driven variants override this to append their
    /// choices.
    fn render(&self, options: &PromptOptions, is_retry: bool, _locale: &str) -> Option<Activity> {
        if is_retry {
            options
                .retry_prompt
                .clone()
                .or_else(|| options.prompt.clone())
        } else {
            options.prompt.clone()
        }
    }
}

/// Context handed to a prompt validator.
pub struct PromptValidatorContext<'t, T> {
    /// The current turn; a validator may send its own message, which
    /// suppresses the built-in retry prompt.
    pub turn: &'t mut TurnContext,
    pub recognized: &'t PromptRecognition<T>,
    /// The prompt's private state bag, persisted across retries.
    pub state: &'t mut StateMap,
    pub options: &'t PromptOptions,
    /// 1-based count of recognition attempts, this one included.
    pub attempt_count: u64,
}

/// A stored validator closure. Its boolean result gates success; errors it
/// raises propagate to the host unswallowed.
pub type PromptValidator<T> = Box<
    dyn for<'s, 't> Fn(&'s mut PromptValidatorContext<'t, T>) -> BoxFuture<'s, Result<bool>>
        + Send
        + Sync,
>;

/// A dialog that elicits, recognizes, and validates one piece of input.
///
/// The recognition strategy is injected per variant; see
/// [`TextRecognizer`], [`ConfirmRecognizer`], [`ChoiceRecognizer`], and
/// [`NumberRecognizer`].
pub struct Prompt<R: PromptRecognizer> {
    id: String,
    recognizer: R,
    validator: Option<PromptValidator<R::Value>>,
}

impl<R: PromptRecognizer> Prompt<R> {
    pub fn new(id: impl Into<String>, recognizer: R) -> Self {
        Self {
            id: id.into(),
            recognizer,
            validator: None,
        }
    }

    pub fn with_validator<F>(mut self, validator: F) -> Self
    where
        F: for<'s, 't> Fn(&'s mut PromptValidatorContext<'t, R::Value>) -> BoxFuture<'s, Result<bool>>
            + Send
            + Sync
            + 'static,
    {
        self.validator = Some(Box::new(validator));
        self
    }

    fn locale_of(&self, turn: &TurnContext) -> String {
        turn.activity()
            .locale
            .as_deref()
            .or_else(|| self.recognizer.default_locale())
            .unwrap_or(DEFAULT_LOCALE)
            .to_string()
    }

    async fn on_prompt(
        &self,
        turn: &mut TurnContext,
        options: &PromptOptions,
        is_retry: bool,
    ) -> Result<()> {
        let locale = self.locale_of(turn);
        if let Some(activity) = self.recognizer.render(options, is_retry, &locale) {
            turn.send_activity(activity).await?;
        }
        Ok(())
    }

    fn read_frame(&self, instance: &DialogInstance) -> Result<(PromptOptions, StateMap)> {
        let options_value = instance.state.get(OPTIONS_KEY).cloned().ok_or_else(|| {
            PalaverError::InvalidInput(format!("prompt '{}' has no stored options", self.id))
        })?;
        let options: PromptOptions = serde_json::from_value(options_value)?;
        let state = match instance.state.get(STATE_KEY) {
            Some(Value::Object(map)) => map.clone(),
            _ => StateMap::new(),
        };
        Ok((options, state))
    }
}

#[async_trait]
impl<R> Dialog for Prompt<R>
where
    R: PromptRecognizer + 'static,
{
    fn id(&self) -> &str {
        &self.id
    }

    async fn begin_dialog(
        &self,
        dc: &mut DialogContext<'_>,
        options: Option<Value>,
    ) -> Result<DialogTurnResult> {
        let options: PromptOptions = match options {
            Some(value) => serde_json::from_value(value)?,
            None => {
                return Err(PalaverError::InvalidInput(format!(
                    "prompt '{}' began without options",
                    self.id
                )));
            }
        };
        {
            let instance = dc.active_instance_mut().ok_or_else(|| {
                PalaverError::Other(format!("prompt '{}' began without a frame", self.id))
            })?;
            instance
                .state
                .insert(OPTIONS_KEY.to_string(), serde_json::to_value(&options)?);
            instance
                .state
                .insert(STATE_KEY.to_string(), Value::Object(StateMap::new()));
        }
        self.on_prompt(dc.turn, &options, false).await?;
        Ok(DialogTurnResult::waiting())
    }

    async fn continue_dialog(&self, dc: &mut DialogContext<'_>) -> Result<DialogTurnResult> {
        // Non-message input never drives recognition.
        if dc.turn.activity().activity_type != ActivityType::Message {
            return Ok(DialogTurnResult::waiting());
        }

        let (options, mut prompt_state) = {
            let instance = dc.active_instance_mut().ok_or_else(|| {
                PalaverError::Other(format!("prompt '{}' continued without a frame", self.id))
            })?;
            self.read_frame(instance)?
        };

        let recognized = self
            .recognizer
            .recognize(dc.turn, &mut prompt_state, &options)
            .await?;
        let attempt_count = prompt_state
            .get(ATTEMPT_COUNT_KEY)
            .and_then(Value::as_u64)
            .unwrap_or(0)
            + 1;
        prompt_state.insert(ATTEMPT_COUNT_KEY.to_string(), Value::from(attempt_count));

        let is_valid = match &self.validator {
            Some(validator) => {
                let mut vctx = PromptValidatorContext {
                    turn: &mut *dc.turn,
                    recognized: &recognized,
                    state: &mut prompt_state,
                    options: &options,
                    attempt_count,
                };
                validator(&mut vctx).await?
            }
            None => recognized.succeeded,
        };

        // Persist prompt-local state before any stack mutation.
        if let Some(instance) = dc.active_instance_mut() {
            instance
                .state
                .insert(STATE_KEY.to_string(), Value::Object(prompt_state));
        }

        if is_valid {
            let value = recognized
                .value
                .map(|v| serde_json::to_value(v))
                .transpose()?;
            return dc.end_dialog(value).await;
        }

        debug!(prompt_id = %self.id, attempt_count, "recognition failed, retrying");
        if !dc.turn.responded() {
            self.on_prompt(dc.turn, &options, true).await?;
        }
        Ok(DialogTurnResult::waiting())
    }

    async fn resume_dialog(
        &self,
        dc: &mut DialogContext<'_>,
        _reason: DialogReason,
        _result: Option<Value>,
    ) -> Result<DialogTurnResult> {
        // A pushed child ended; put the question back in front of the user.
        let options = {
            let instance = dc.active_instance_mut().ok_or_else(|| {
                PalaverError::Other(format!("prompt '{}' resumed without a frame", self.id))
            })?;
            self.read_frame(instance)?.0
        };
        self.on_prompt(dc.turn, &options, false).await?;
        Ok(DialogTurnResult::waiting())
    }

    async fn reprompt_dialog(
        &self,
        turn: &mut TurnContext,
        instance: &mut DialogInstance,
    ) -> Result<()> {
        let (options, _) = self.read_frame(instance)?;
        self.on_prompt(turn, &options, false).await
    }
}
