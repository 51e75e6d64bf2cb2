// src/recognizers/find_choices.rs
// Choice matching over the fuzzy value search, with ordinal/numeric fallbacks

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::find_values::{find_values, FindValuesOptions, SortedValue};
use super::numbers::{recognize_number, recognize_ordinal};
use super::tokenizer::{tokenize, TokenizerFn};
use super::ModelResult;

use crate::activity::DEFAULT_LOCALE;

/// Alternate display action attached to a choice; its title doubles as a
/// synonym unless disabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceAction {
    pub title: String,
}

/// One labeled choice a prompt offers the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Choice {
    /// Canonical value returned when this choice is recognized.
    pub value: String,
    /// Optional alternate display/synonym source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<ChoiceAction>,
    /// Additional strings that should match this choice.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub synonyms: Vec<String>,
}

impl Choice {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            action: None,
            synonyms: Vec::new(),
        }
    }

    pub fn with_synonyms(mut self, synonyms: &[&str]) -> Self {
        self.synonyms = synonyms.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_action_title(mut self, title: impl Into<String>) -> Self {
        self.action = Some(ChoiceAction {
            title: title.into(),
        });
        self
    }
}

impl From<&str> for Choice {
    fn from(value: &str) -> Self {
        Choice::new(value)
    }
}

impl From<String> for Choice {
    fn from(value: String) -> Self {
        Choice::new(value)
    }
}

/// A choice found inside an utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoundChoice {
    /// Canonical value of the matched choice.
    pub value: String,
    /// 0-based position of the choice in the offered list.
    pub index: usize,
    /// Confidence on a 0.0–1.0 scale.
    pub score: f64,
    /// The synonym string that actually matched, when matched by text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synonym: Option<String>,
}

/// Options controlling [`find_choices`] and [`recognize_choices`].
#[derive(Clone)]
pub struct FindChoicesOptions {
    /// Exclude each choice's canonical value from the synonym corpus.
    pub no_value: bool,
    /// Exclude each choice's action title from the synonym corpus.
    pub no_action: bool,
    /// Let [`recognize_choices`] fall back to ordinal expressions.
    pub recognize_ordinals: bool,
    /// Let [`recognize_choices`] fall back to plain numbers.
    pub recognize_numbers: bool,
    pub allow_partial_matches: bool,
    pub max_token_distance: usize,
    pub locale: Option<String>,
    pub tokenizer: TokenizerFn,
}

impl Default for FindChoicesOptions {
    fn default() -> Self {
        Self {
            no_value: false,
            no_action: false,
            recognize_ordinals: true,
            recognize_numbers: true,
            allow_partial_matches: false,
            max_token_distance: 2,
            locale: None,
            tokenizer: tokenize,
        }
    }
}

impl FindChoicesOptions {
    fn find_values_options(&self) -> FindValuesOptions {
        FindValuesOptions {
            allow_partial_matches: self.allow_partial_matches,
            max_token_distance: self.max_token_distance,
            locale: self.locale.clone(),
            tokenizer: self.tokenizer,
        }
    }

    fn locale(&self) -> &str {
        self.locale.as_deref().unwrap_or(DEFAULT_LOCALE)
    }
}

/// Find occurrences of the given choices inside the utterance by text
/// match, searching each choice's value, action title, and synonyms.
pub fn find_choices(
    utterance: &str,
    choices: &[Choice],
    options: &FindChoicesOptions,
) -> Vec<ModelResult<FoundChoice>> {
    // Full synonym corpus, every entry tagged with its owning choice.
    let mut synonyms: Vec<SortedValue> = Vec::new();
    for (index, choice) in choices.iter().enumerate() {
        if !options.no_value {
            synonyms.push(SortedValue::new(choice.value.clone(), index));
        }
        if let Some(action) = &choice.action {
            if !options.no_action {
                synonyms.push(SortedValue::new(action.title.clone(), index));
            }
        }
        for synonym in &choice.synonyms {
            synonyms.push(SortedValue::new(synonym.clone(), index));
        }
    }

    find_values(utterance, &synonyms, &options.find_values_options())
        .into_iter()
        .map(|m| {
            let choice = &choices[m.resolution.index];
            ModelResult {
                start: m.start,
                end: m.end,
                text: m.text,
                resolution: FoundChoice {
                    value: choice.value.clone(),
                    index: m.resolution.index,
                    score: m.resolution.score,
                    synonym: Some(m.resolution.value),
                },
            }
        })
        .collect()
}

/// Recognize which choice a reply refers to, using a single strategy per
/// call: text match first, then ordinal expressions, then plain numbers.
/// Mixing strategies would mis-recognize replies like "the third one" as
/// both a choice and an index.
pub fn recognize_choices(
    utterance: &str,
    choices: &[Choice],
    options: &FindChoicesOptions,
) -> Vec<ModelResult<FoundChoice>> {
    let mut matched = find_choices(utterance, choices, options);
    if !matched.is_empty() {
        return matched;
    }

    let locale = options.locale();
    if options.recognize_ordinals {
        for ordinal in recognize_ordinal(utterance, locale) {
            push_index_match(&mut matched, choices, ordinal);
        }
    }
    if matched.is_empty() && options.recognize_numbers {
        for number in recognize_number(utterance, locale) {
            push_index_match(&mut matched, choices, number);
        }
    }
    matched.sort_by_key(|m| m.start);
    matched
}

/// Map a 1-based recognized number to a choice; out-of-range values are
/// silently discarded.
fn push_index_match(
    out: &mut Vec<ModelResult<FoundChoice>>,
    choices: &[Choice],
    m: ModelResult<i64>,
) {
    let value = m.resolution;
    if value > 0 && (value as usize) <= choices.len() {
        let index = value as usize - 1;
        out.push(ModelResult {
            start: m.start,
            end: m.end,
            text: m.text,
            resolution: FoundChoice {
                value: choices[index].value.clone(),
                index,
                score: 1.0,
                synonym: None,
            },
        });
    } else {
        debug!(value, choices = choices.len(), "discarding out-of-range choice index");
    }
}
