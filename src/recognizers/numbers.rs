// src/recognizers/numbers.rs
// Locale word tables and the boolean/ordinal/cardinal recognizers

//! Small, self-contained locale support for the recognizers that back
//! confirm prompts and choice-index fallbacks. Lookup resolves the full
//! locale tag first ("en-us" → "en"), falling back to English for anything
//! unknown.

use super::find_values::{find_values, FindValuesOptions, SortedValue};
use super::tokenizer::tokenize;
use super::ModelResult;

/// Word tables for one language.
pub(crate) struct LocaleWords {
    pub yes: &'static [&'static str],
    pub no: &'static [&'static str],
    /// Ordinal words mapped to 1-based values; relative ordinals ("last")
    /// map to -1 and fall out of range downstream.
    pub ordinals: &'static [(&'static str, i64)],
    /// Cardinal number words mapped to their values.
    pub cardinals: &'static [(&'static str, i64)],
    /// Suffixes that mark a digit run as an ordinal ("2nd").
    pub ordinal_suffixes: &'static [&'static str],
    /// Canonical yes/no display pair for confirm prompts.
    pub confirm: (&'static str, &'static str),
    /// Connector used when rendering inline choice lists.
    pub or_word: &'static str,
}

static EN: LocaleWords = LocaleWords {
    yes: &[
        "yes", "y", "yeah", "yep", "yup", "sure", "ok", "okay", "true", "correct", "uh huh",
        "affirmative",
    ],
    no: &["no", "n", "nope", "nah", "never", "false", "negative"],
    ordinals: &[
        ("first", 1),
        ("second", 2),
        ("third", 3),
        ("fourth", 4),
        ("fifth", 5),
        ("sixth", 6),
        ("seventh", 7),
        ("eighth", 8),
        ("ninth", 9),
        ("tenth", 10),
        ("last", -1),
    ],
    cardinals: &[
        ("zero", 0),
        ("one", 1),
        ("two", 2),
        ("three", 3),
        ("four", 4),
        ("five", 5),
        ("six", 6),
        ("seven", 7),
        ("eight", 8),
        ("nine", 9),
        ("ten", 10),
    ],
    ordinal_suffixes: &["st", "nd", "rd", "th"],
    confirm: ("yes", "no"),
    or_word: "or",
};

static ES: LocaleWords = LocaleWords {
    yes: &["sí", "si", "claro", "vale", "correcto", "afirmativo"],
    no: &["no", "nunca", "jamás", "negativo", "falso"],
    ordinals: &[
        ("primero", 1),
        ("primera", 1),
        ("primer", 1),
        ("segundo", 2),
        ("segunda", 2),
        ("tercero", 3),
        ("tercera", 3),
        ("tercer", 3),
        ("cuarto", 4),
        ("cuarta", 4),
        ("quinto", 5),
        ("quinta", 5),
        ("sexto", 6),
        ("séptimo", 7),
        ("octavo", 8),
        ("noveno", 9),
        ("décimo", 10),
        ("último", -1),
        ("última", -1),
    ],
    cardinals: &[
        ("cero", 0),
        ("uno", 1),
        ("una", 1),
        ("dos", 2),
        ("tres", 3),
        ("cuatro", 4),
        ("cinco", 5),
        ("seis", 6),
        ("siete", 7),
        ("ocho", 8),
        ("nueve", 9),
        ("diez", 10),
    ],
    ordinal_suffixes: &["º", "ª"],
    confirm: ("sí", "no"),
    or_word: "o",
};

static FR: LocaleWords = LocaleWords {
    yes: &["oui", "ouais", "d'accord", "certainement", "bien sûr"],
    no: &["non", "jamais", "faux"],
    ordinals: &[
        ("premier", 1),
        ("première", 1),
        ("deuxième", 2),
        ("seconde", 2),
        ("troisième", 3),
        ("quatrième", 4),
        ("cinquième", 5),
        ("sixième", 6),
        ("septième", 7),
        ("huitième", 8),
        ("neuvième", 9),
        ("dixième", 10),
        ("dernier", -1),
        ("dernière", -1),
    ],
    cardinals: &[
        ("zéro", 0),
        ("un", 1),
        ("une", 1),
        ("deux", 2),
        ("trois", 3),
        ("quatre", 4),
        ("cinq", 5),
        ("six", 6),
        ("sept", 7),
        ("huit", 8),
        ("neuf", 9),
        ("dix", 10),
    ],
    ordinal_suffixes: &["e", "ème", "er", "ère"],
    confirm: ("oui", "non"),
    or_word: "ou",
};

/// Resolve the word table for a locale tag, falling back to English.
pub(crate) fn words_for(locale: &str) -> &'static LocaleWords {
    let tag = locale.to_lowercase();
    let primary = tag.split(['-', '_']).next().unwrap_or("en");
    match primary {
        "es" => &ES,
        "fr" => &FR,
        _ => &EN,
    }
}

/// Recognize yes/no style phrases in the utterance, in reading order.
pub fn recognize_boolean(utterance: &str, locale: &str) -> Vec<ModelResult<bool>> {
    let words = words_for(locale);
    let mut corpus: Vec<SortedValue> = Vec::new();
    for phrase in words.yes {
        corpus.push(SortedValue::new(*phrase, 0));
    }
    for phrase in words.no {
        corpus.push(SortedValue::new(*phrase, 1));
    }
    find_values(utterance, &corpus, &FindValuesOptions::default())
        .into_iter()
        .map(|m| ModelResult {
            start: m.start,
            end: m.end,
            text: m.text,
            resolution: m.resolution.index == 0,
        })
        .collect()
}

/// Recognize ordinal expressions ("the second one", "3rd") as 1-based
/// values. Relative ordinals ("last") resolve to -1.
pub fn recognize_ordinal(utterance: &str, locale: &str) -> Vec<ModelResult<i64>> {
    let words = words_for(locale);
    let mut results = Vec::new();
    for token in tokenize(utterance, Some(locale)) {
        let value = words
            .ordinals
            .iter()
            .find(|(w, _)| *w == token.normalized)
            .map(|(_, v)| *v)
            .or_else(|| parse_suffixed_ordinal(&token.normalized, words));
        if let Some(value) = value {
            results.push(ModelResult {
                start: token.start,
                end: token.end,
                text: token.text,
                resolution: value,
            });
        }
    }
    results
}

/// Recognize plain integers in the utterance, either digit runs or cardinal
/// number words.
pub fn recognize_number(utterance: &str, locale: &str) -> Vec<ModelResult<i64>> {
    let words = words_for(locale);
    let mut results = Vec::new();
    for token in tokenize(utterance, Some(locale)) {
        let normalized = &token.normalized;
        let value = if normalized.chars().all(|c| c.is_ascii_digit()) {
            normalized.parse::<i64>().ok()
        } else {
            words
                .cardinals
                .iter()
                .find(|(w, _)| w == normalized)
                .map(|(_, v)| *v)
        };
        if let Some(value) = value {
            results.push(ModelResult {
                start: token.start,
                end: token.end,
                text: token.text,
                resolution: value,
            });
        }
    }
    results
}

fn parse_suffixed_ordinal(normalized: &str, words: &LocaleWords) -> Option<i64> {
    for suffix in words.ordinal_suffixes {
        if let Some(stripped) = normalized.strip_suffix(suffix) {
            if !stripped.is_empty() && stripped.chars().all(|c| c.is_ascii_digit()) {
                return stripped.parse::<i64>().ok();
            }
        }
    }
    None
}
