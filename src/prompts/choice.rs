// src/prompts/choice.rs
// Closed-list choice prompt variant

use async_trait::async_trait;

use super::render::append_choices;
use super::{PromptOptions, PromptRecognition, PromptRecognizer};
use crate::activity::Activity;
use crate::error::Result;
use crate::recognizers::{recognize_choices, FindChoicesOptions, FoundChoice};
use crate::state::StateMap;
use crate::turn::TurnContext;

/// Interprets replies against `options.choices`, including ordinal and
/// numeric index fallbacks ("the second one", "2").
#[derive(Clone, Default)]
pub struct ChoiceRecognizer {
    /// Locale assumed when the inbound activity carries none.
    pub default_locale: Option<String>,
    /// Matching knobs forwarded to the choice recognizer.
    pub find_options: FindChoicesOptions,
}

impl ChoiceRecognizer {
    pub fn with_locale(locale: impl Into<String>) -> Self {
        Self {
            default_locale: Some(locale.into()),
            find_options: FindChoicesOptions::default(),
        }
    }
}

#[async_trait]
impl PromptRecognizer for ChoiceRecognizer {
    type Value = FoundChoice;

    async fn recognize(
        &self,
        turn: &mut TurnContext,
        _state: &mut StateMap,
        options: &PromptOptions,
    ) -> Result<PromptRecognition<FoundChoice>> {
        let utterance = turn.activity().text_or_empty().to_string();
        if utterance.trim().is_empty() || options.choices.is_empty() {
            return Ok(PromptRecognition::failure());
        }
        let locale = turn
            .activity()
            .locale
            .clone()
            .or_else(|| self.default_locale.clone())
            .unwrap_or_else(|| crate::activity::DEFAULT_LOCALE.to_string());

        let mut find_options = self.find_options.clone();
        find_options.locale = Some(locale);
        let results = recognize_choices(&utterance, &options.choices, &find_options);
        match results.into_iter().next() {
            Some(first) => Ok(PromptRecognition::success(first.resolution)),
            None => Ok(PromptRecognition::failure()),
        }
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
        append_choices(base, &options.choices, options.style, locale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompts::ListStyle;
    use crate::turn::RecordingTransport;
    use std::sync::Arc;

    fn color_options() -> PromptOptions {
        PromptOptions::with_text("Pick a color.").choices(["red", "green", "blue"])
    }

    async fn recognize(text: &str) -> PromptRecognition<FoundChoice> {
        let mut turn = TurnContext::new(
            Arc::new(RecordingTransport::new()),
            Activity::message(text).with_locale("en-us"),
        );
        ChoiceRecognizer::default()
            .recognize(&mut turn, &mut StateMap::new(), &color_options())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_recognize_by_text() {
        let result = recognize("green please").await;
        assert!(result.succeeded);
        let found = result.value.unwrap();
        assert_eq!(found.value, "green");
        assert_eq!(found.index, 1);
    }

    #[tokio::test]
    async fn test_recognize_by_number() {
        let result = recognize("2").await;
        let found = result.value.unwrap();
        assert_eq!(found.value, "green");
        assert_eq!(found.index, 1);
        assert_eq!(found.score, 1.0);
    }

    #[tokio::test]
    async fn test_recognize_by_ordinal() {
        let result = recognize("the third one").await;
        let found = result.value.unwrap();
        assert_eq!(found.value, "blue");
    }

    #[tokio::test]
    async fn test_unmatched_fails() {
        let result = recognize("purple").await;
        assert!(!result.succeeded);
    }

    #[tokio::test]
    async fn test_empty_choice_list_fails() {
        let mut turn = TurnContext::new(
            Arc::new(RecordingTransport::new()),
            Activity::message("red").with_locale("en-us"),
        );
        let result = ChoiceRecognizer::default()
            .recognize(
                &mut turn,
                &mut StateMap::new(),
                &PromptOptions::with_text("Pick."),
            )
            .await
            .unwrap();
        assert!(!result.succeeded);
    }

    #[test]
    fn test_render_inline() {
        let rendered = ChoiceRecognizer::default()
            .render(&color_options(), false, "en-us")
            .unwrap();
        assert_eq!(
            rendered.text.as_deref(),
            Some("Pick a color. (1) red, (2) green, or (3) blue")
        );
    }

    #[test]
    fn test_render_retry_prefers_retry_prompt() {
        let options = color_options().retry_text("Please pick one of these.");
        let rendered = ChoiceRecognizer::default()
            .render(&options, true, "en-us")
            .unwrap();
        assert!(rendered
            .text
            .as_deref()
            .unwrap()
            .starts_with("Please pick one of these."));
    }

    #[test]
    fn test_render_list_style() {
        let mut options = color_options();
        options.style = ListStyle::List;
        let rendered = ChoiceRecognizer::default()
            .render(&options, false, "en-us")
            .unwrap();
        assert!(rendered.text.as_deref().unwrap().contains("\n   2. green"));
    }
}
