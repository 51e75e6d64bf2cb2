// src/prompts/text.rs
// Free-text prompt variant

use async_trait::async_trait;

use super::{PromptOptions, PromptRecognition, PromptRecognizer};
use crate::error::Result;
use crate::state::StateMap;
use crate::turn::TurnContext;

/// Accepts any non-empty reply as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextRecognizer;

#[async_trait]
impl PromptRecognizer for TextRecognizer {
    type Value = String;

    async fn recognize(
        &self,
        turn: &mut TurnContext,
        _state: &mut StateMap,
        _options: &PromptOptions,
    ) -> Result<PromptRecognition<String>> {
        let text = turn.activity().text_or_empty().trim();
        if text.is_empty() {
            Ok(PromptRecognition::failure())
        } else {
            Ok(PromptRecognition::success(text.to_string()))
        }
    }
}
