// src/prompts/confirm.rs
// Yes/no prompt variant

use async_trait::async_trait;

use super::render::{append_choices, ListStyle};
use super::{PromptOptions, PromptRecognition, PromptRecognizer};
use crate::activity::Activity;
use crate::error::Result;
use crate::recognizers::numbers::words_for;
use crate::recognizers::{recognize_boolean, recognize_choices, Choice, FindChoicesOptions};
use crate::state::StateMap;
use crate::turn::TurnContext;

/// Maps locale-specific yes/no phrases to a boolean; when no phrase
/// matches, the numeric "1"/"2" choice fallback kicks in unless disabled.
#[derive(Debug, Clone, Default)]
pub struct ConfirmRecognizer {
    /// Locale assumed when the inbound activity carries none.
    pub default_locale: Option<String>,
    /// Whether "1"/"2" style replies map to yes/no. Unset is treated as
    /// true; kept optional so the default can be flipped per deployment.
    pub include_numbers: Option<bool>,
}

impl ConfirmRecognizer {
    pub fn with_locale(locale: impl Into<String>) -> Self {
        Self {
            default_locale: Some(locale.into()),
            include_numbers: None,
        }
    }

    fn include_numbers(&self) -> bool {
        self.include_numbers.unwrap_or(true)
    }

    fn confirm_choices(locale: &str) -> Vec<Choice> {
        let words = words_for(locale);
        vec![Choice::new(words.confirm.0), Choice::new(words.confirm.1)]
    }
}

#[async_trait]
impl PromptRecognizer for ConfirmRecognizer {
    type Value = bool;

    async fn recognize(
        &self,
        turn: &mut TurnContext,
        _state: &mut StateMap,
        _options: &PromptOptions,
    ) -> Result<PromptRecognition<bool>> {
        let utterance = turn.activity().text_or_empty().to_string();
        if utterance.trim().is_empty() {
            return Ok(PromptRecognition::failure());
        }
        let locale = turn
            .activity()
            .locale
            .clone()
            .or_else(|| self.default_locale.clone())
            .unwrap_or_else(|| crate::activity::DEFAULT_LOCALE.to_string());

        // Direct yes/no phrase first.
        if let Some(first) = recognize_boolean(&utterance, &locale).first() {
            return Ok(PromptRecognition::success(first.resolution));
        }

        // Then the numbered confirm choices, so "1"/"2" (or "the first
        // one") still resolve.
        if self.include_numbers() {
            let choices = Self::confirm_choices(&locale);
            let options = FindChoicesOptions {
                locale: Some(locale),
                ..Default::default()
            };
            if let Some(first) = recognize_choices(&utterance, &choices, &options).first() {
                return Ok(PromptRecognition::success(first.resolution.index == 0));
            }
        }

        Ok(PromptRecognition::failure())
    }

    fn default_locale(&self) -> Option<&str> {
        self.default_locale.as_deref()
    }

    fn render(&self, options: &PromptOptions, is_retry: bool, locale: &str) -> Option<Activity> {
        let base = if is_retry {
            options
                .retry_prompt
                .as_ref()
                .or(options.prompt.as_ref())
        } else {
            options.prompt.as_ref()
        };
        if self.include_numbers() {
            append_choices(base, &Self::confirm_choices(locale), ListStyle::Inline, locale)
        } else {
            let words = words_for(locale);
            let suffix = format!(" {} {} {}", words.confirm.0, words.or_word, words.confirm.1);
            base.map(|activity| {
                let mut out = activity.clone();
                let text = out.text.take().unwrap_or_default();
                out.text = Some(format!("{text}{suffix}"));
                out
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::turn::RecordingTransport;
    use std::sync::Arc;

    async fn recognize(recognizer: &ConfirmRecognizer, activity: Activity) -> PromptRecognition<bool> {
        let mut turn = TurnContext::new(Arc::new(RecordingTransport::new()), activity);
        recognizer
            .recognize(&mut turn, &mut StateMap::new(), &PromptOptions::default())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_yes_en_us() {
        let recognizer = ConfirmRecognizer::default();
        let result = recognize(&recognizer, Activity::message("yes").with_locale("en-us")).await;
        assert!(result.succeeded);
        assert_eq!(result.value, Some(true));
    }

    #[tokio::test]
    async fn test_nope_is_false() {
        let recognizer = ConfirmRecognizer::default();
        let result = recognize(&recognizer, Activity::message("nope").with_locale("en-us")).await;
        assert!(result.succeeded);
        assert_eq!(result.value, Some(false));
    }

    #[tokio::test]
    async fn test_numeric_fallback() {
        let recognizer = ConfirmRecognizer::default();
        let result = recognize(&recognizer, Activity::message("1").with_locale("en-us")).await;
        assert_eq!(result.value, Some(true));
        let result = recognize(&recognizer, Activity::message("2").with_locale("en-us")).await;
        assert_eq!(result.value, Some(false));
    }

    #[tokio::test]
    async fn test_numeric_fallback_disabled() {
        let recognizer = ConfirmRecognizer {
            include_numbers: Some(false),
            ..Default::default()
        };
        let result = recognize(&recognizer, Activity::message("1").with_locale("en-us")).await;
        assert!(!result.succeeded);
    }

    #[tokio::test]
    async fn test_unrecognized_fails() {
        let recognizer = ConfirmRecognizer::default();
        let result = recognize(&recognizer, Activity::message("bananas").with_locale("en-us")).await;
        assert!(!result.succeeded);
        assert!(result.value.is_none());
    }

    #[tokio::test]
    async fn test_spanish_si() {
        let recognizer = ConfirmRecognizer::default();
        let result = recognize(&recognizer, Activity::message("sí").with_locale("es-es")).await;
        assert_eq!(result.value, Some(true));
    }

    #[tokio::test]
    async fn test_default_locale_applies_when_activity_has_none() {
        let recognizer = ConfirmRecognizer::with_locale("es-es");
        let result = recognize(&recognizer, Activity::message("claro")).await;
        assert_eq!(result.value, Some(true));
    }

    #[test]
    fn test_render_appends_numbered_pair() {
        let recognizer = ConfirmRecognizer::default();
        let options = PromptOptions::with_text("Proceed?");
        let rendered = recognizer.render(&options, false, "en-us").unwrap();
        assert_eq!(rendered.text.as_deref(), Some("Proceed? (1) yes or (2) no"));
    }

    #[test]
    fn test_render_without_numbers() {
        let recognizer = ConfirmRecognizer {
            include_numbers: Some(false),
            ..Default::default()
        };
        let options = PromptOptions::with_text("Proceed?");
        let rendered = recognizer.render(&options, false, "en-us").unwrap();
        assert_eq!(rendered.text.as_deref(), Some("Proceed? yes or no"));
    }
}
