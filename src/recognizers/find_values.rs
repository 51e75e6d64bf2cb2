// src/recognizers/find_values.rs
// Fuzzy search for candidate values inside an utterance

//! Finds the best non-overlapping occurrences of candidate strings inside an
//! utterance. Candidates are searched longest-first so "second last" beats
//! "last"; token order is required; small gaps between matched tokens are
//! tolerated up to a configurable distance and count against the match's
//! accuracy.

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::tokenizer::{tokenize, Token, TokenizerFn};
use super::ModelResult;

/// A candidate string tagged with the index of the choice/value it belongs
/// to. Several candidates (synonyms) may share one index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortedValue {
    pub value: String,
    pub index: usize,
}

impl SortedValue {
    pub fn new(value: impl Into<String>, index: usize) -> Self {
        Self {
            value: value.into(),
            index,
        }
    }
}

/// A value found inside an utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoundValue {
    /// The candidate string that matched.
    pub value: String,
    /// Index of the choice/value the candidate belongs to.
    pub index: usize,
    /// Confidence on a 0.0–1.0 scale: completeness × accuracy.
    pub score: f64,
}

/// Options controlling [`find_values`].
#[derive(Clone)]
pub struct FindValuesOptions {
    /// Accept matches where only some of a candidate's tokens were found.
    pub allow_partial_matches: bool,
    /// Maximum token-position gap tolerated between two consecutively
    /// matched tokens; a candidate token found further away is skipped.
    pub max_token_distance: usize,
    /// Locale passed through to the tokenizer.
    pub locale: Option<String>,
    /// Tokenizer override.
    pub tokenizer: TokenizerFn,
}

impl Default for FindValuesOptions {
    fn default() -> Self {
        Self {
            allow_partial_matches: false,
            max_token_distance: 2,
            locale: None,
            tokenizer: tokenize,
        }
    }
}

/// Candidate match over token positions; spans are inclusive token indices
/// until the final translation to byte offsets.
struct TokenMatch {
    start: usize,
    end: usize,
    value: String,
    index: usize,
    score: f64,
}

/// Find all candidate values inside the utterance, deduplicated so no two
/// results share a value index or overlap in the utterance, ordered by start
/// offset. Deterministic for fixed inputs.
pub fn find_values(
    utterance: &str,
    values: &[SortedValue],
    options: &FindValuesOptions,
) -> Vec<ModelResult<FoundValue>> {
    let tokens = (options.tokenizer)(utterance, options.locale.as_deref());

    // Longest value first, so composite values win over their own parts.
    // The sort is stable: equal lengths keep the caller's ordering.
    let mut sorted: Vec<&SortedValue> = values.iter().collect();
    sorted.sort_by(|a, b| b.value.chars().count().cmp(&a.value.chars().count()));

    let mut matches: Vec<TokenMatch> = Vec::new();
    for entry in sorted {
        let value_tokens = (options.tokenizer)(&entry.value, options.locale.as_deref());
        if value_tokens.is_empty() {
            continue;
        }
        // Scan forward from a cursor so every occurrence of the value is
        // found, not just the first.
        let mut start_pos = 0;
        while start_pos < tokens.len() {
            match match_value(&tokens, options, entry, &value_tokens, start_pos) {
                Some(m) => {
                    start_pos = m.end + 1;
                    matches.push(m);
                }
                None => break,
            }
        }
    }

    // Best matches first; stable, so longer values keep priority on ties.
    matches.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

    // Greedy selection: one match per value index, no overlapping spans.
    let mut found_indexes: HashSet<usize> = HashSet::new();
    let mut used_tokens: HashSet<usize> = HashSet::new();
    let mut results: Vec<ModelResult<FoundValue>> = Vec::new();
    for m in matches {
        if found_indexes.contains(&m.index) {
            continue;
        }
        if (m.start..=m.end).any(|i| used_tokens.contains(&i)) {
            continue;
        }
        found_indexes.insert(m.index);
        used_tokens.extend(m.start..=m.end);

        // Translate token positions back to utterance offsets.
        let start = tokens[m.start].start;
        let end = tokens[m.end].end;
        trace!(value = %m.value, index = m.index, score = m.score, "accepted value match");
        results.push(ModelResult {
            start,
            end,
            text: utterance[start..end].to_string(),
            resolution: FoundValue {
                value: m.value,
                index: m.index,
                score: m.score,
            },
        });
    }

    // Back to reading order.
    results.sort_by_key(|r| r.start);
    results
}

/// Try to match one candidate against the utterance tokens starting at
/// `start_pos`. Tokens must appear in order; a candidate token found more
/// than `max_token_distance` positions past the cursor is skipped, and the
/// gaps of accepted tokens accumulate as deviation.
fn match_value(
    tokens: &[Token],
    options: &FindValuesOptions,
    entry: &SortedValue,
    value_tokens: &[Token],
    mut start_pos: usize,
) -> Option<TokenMatch> {
    let mut matched = 0usize;
    let mut total_deviation = 0usize;
    let mut start: Option<usize> = None;
    let mut end = 0usize;

    for value_token in value_tokens {
        if let Some(pos) = index_of_token(tokens, value_token, start_pos) {
            let distance = if matched > 0 { pos - start_pos } else { 0 };
            if distance <= options.max_token_distance {
                matched += 1;
                total_deviation += distance;
                start_pos = pos + 1;
                if start.is_none() {
                    start = Some(pos);
                }
                end = pos;
            }
        }
    }

    if matched > 0 && (matched == value_tokens.len() || options.allow_partial_matches) {
        // Floating-point throughout: integer division would zero every
        // non-exact score.
        let completeness = matched as f64 / value_tokens.len() as f64;
        let accuracy = matched as f64 / (matched + total_deviation) as f64;
        let score = completeness * accuracy;
        Some(TokenMatch {
            start: start.unwrap_or(0),
            end,
            value: entry.value.clone(),
            index: entry.index,
            score,
        })
    } else {
        None
    }
}

fn index_of_token(tokens: &[Token], token: &Token, start_pos: usize) -> Option<usize> {
    tokens[start_pos.min(tokens.len())..]
        .iter()
        .position(|t| t.normalized == token.normalized)
        .map(|i| i + start_pos)
}
