// src/prompts/number.rs
// Integer prompt variant

use async_trait::async_trait;

use super::{PromptOptions, PromptRecognition, PromptRecognizer};
use crate::error::Result;
use crate::recognizers::recognize_number;
use crate::state::StateMap;
use crate::turn::TurnContext;

/// Recognizes integers in the reply, digits or cardinal words.
#[derive(Debug, Clone, Default)]
pub struct NumberRecognizer {
    /// Locale assumed when the inbound activity carries none.
    pub default_locale: Option<String>,
}

#[async_trait]
impl PromptRecognizer for NumberRecognizer {
    type Value = i64;

    async fn recognize(
        &self,
        turn: &mut TurnContext,
        _state: &mut StateMap,
        _options: &PromptOptions,
    ) -> Result<PromptRecognition<i64>> {
        let utterance = turn.activity().text_or_empty().to_string();
        let locale = turn
            .activity()
            .locale
            .clone()
            .or_else(|| self.default_locale.clone())
            .unwrap_or_else(|| crate::activity::DEFAULT_LOCALE.to_string());
        match recognize_number(&utterance, &locale).first() {
            Some(first) => Ok(PromptRecognition::success(first.resolution)),
            None => Ok(PromptRecognition::failure()),
        }
    }

    fn default_locale(&self) -> Option<&str> {
        self.default_locale.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::Activity;
    use crate::turn::RecordingTransport;
    use std::sync::Arc;

    async fn recognize(text: &str) -> PromptRecognition<i64> {
        let mut turn = TurnContext::new(
            Arc::new(RecordingTransport::new()),
            Activity::message(text).with_locale("en-us"),
        );
        NumberRecognizer::default()
            .recognize(&mut turn, &mut StateMap::new(), &PromptOptions::default())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_digits() {
        let result = recognize("about 7 of them").await;
        assert_eq!(result.value, Some(7));
    }

    #[tokio::test]
    async fn test_cardinal_word() {
        let result = recognize("three").await;
        assert_eq!(result.value, Some(3));
    }

    #[tokio::test]
    async fn test_no_number_fails() {
        let result = recognize("several").await;
        assert!(!result.succeeded);
    }
}
