// src/recognizers/mod.rs
// Free-text recognizers: tokenization, fuzzy value search, choice matching

//! The recognition pipeline elicitation dialogs use to interpret replies
//! against a closed set of expected values:
//!
//! - [`tokenizer`]: position-tagged, lowercase-normalized tokens
//! - [`find_values`]: best non-overlapping occurrences of candidate strings
//! - [`find_choices`]: labeled choices with synonyms, plus ordinal/numeric
//!   fallbacks layered on top
//! - [`numbers`]: locale word tables for yes/no, ordinals, and cardinals

pub mod find_choices;
pub mod find_values;
pub mod numbers;
pub mod tokenizer;

use serde::{Deserialize, Serialize};

pub use find_choices::{
    find_choices, recognize_choices, Choice, ChoiceAction, FindChoicesOptions, FoundChoice,
};
pub use find_values::{find_values, FindValuesOptions, FoundValue, SortedValue};
pub use numbers::{recognize_boolean, recognize_number, recognize_ordinal};
pub use tokenizer::{tokenize, Token, TokenizerFn};

/// A recognized span of the utterance together with what it resolved to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelResult<T> {
    /// Byte offset of the first matched character in the utterance.
    pub start: usize,
    /// Byte offset just past the last matched character.
    pub end: usize,
    /// The matched slice of the utterance.
    pub text: String,
    /// What the span resolved to.
    pub resolution: T,
}
