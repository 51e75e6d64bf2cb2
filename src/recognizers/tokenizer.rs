// src/recognizers/tokenizer.rs
// Position-tagged, lowercase-normalized tokenization

use serde::{Deserialize, Serialize};

/// A position-tagged lexical unit produced from text. Tokens are produced
/// per call and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Byte offset of the first character in the original text.
    pub start: usize,
    /// Byte offset just past the last character, so
    /// `&text[start..end] == token.text` always holds.
    pub end: usize,
    /// Raw slice of the original text.
    pub text: String,
    /// Lowercase form used for matching.
    pub normalized: String,
}

/// Tokenizer function signature; pluggable so matchers can be driven with a
/// custom tokenization.
pub type TokenizerFn = fn(&str, Option<&str>) -> Vec<Token>;

/// Split `text` into tokens. Pure function of its input: restartable,
/// deterministic, empty input yields an empty vec.
///
/// A code point in the breaking set ends the current token; a code point
/// outside the Basic Multilingual Plane (emoji and other supplementary-plane
/// glyphs) is emitted as its own single-character token; everything else
/// accumulates into the current token. The locale is accepted for signature
/// compatibility with locale-sensitive tokenizers but is not consulted here.
pub fn tokenize(text: &str, _locale: Option<&str>) -> Vec<Token> {
    let mut tokens: Vec<Token> = Vec::new();
    let mut current: Option<(usize, String)> = None;

    let mut flush = |current: &mut Option<(usize, String)>, end: usize, tokens: &mut Vec<Token>| {
        if let Some((start, text)) = current.take() {
            let normalized = text.to_lowercase();
            tokens.push(Token {
                start,
                end,
                text,
                normalized,
            });
        }
    };

    for (i, chr) in text.char_indices() {
        let code_point = chr as u32;
        if is_breaking_char(code_point) {
            flush(&mut current, i, &mut tokens);
        } else if code_point > 0xFFFF {
            // Supplementary plane: each glyph is its own token.
            flush(&mut current, i, &mut tokens);
            let text = chr.to_string();
            tokens.push(Token {
                start: i,
                end: i + chr.len_utf8(),
                text: text.clone(),
                normalized: text,
            });
        } else {
            match &mut current {
                Some((_, buf)) => buf.push(chr),
                None => current = Some((i, chr.to_string())),
            }
        }
    }
    flush(&mut current, text.len(), &mut tokens);

    tokens
}

/// Breaking set: ASCII punctuation/control ranges plus the general
/// punctuation/symbol blocks.
fn is_breaking_char(code_point: u32) -> bool {
    matches!(
        code_point,
        0x0000..=0x002F
            | 0x003A..=0x0040
            | 0x005B..=0x0060
            | 0x007B..=0x00BF
            | 0x02B9..=0x036F
            | 0x2000..=0x2BFF
            | 0x2E00..=0x2E7F
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert!(tokenize("", None).is_empty());
    }

    #[test]
    fn test_simple_words() {
        let tokens = tokenize("the quick brown fox", None);
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["the", "quick", "brown", "fox"]);
    }

    #[test]
    fn test_punctuation_breaks() {
        let tokens = tokenize("hello, world!", None);
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["hello", "world"]);
    }

    #[test]
    fn test_normalized_is_lowercase() {
        let tokens = tokenize("Hello World", None);
        assert_eq!(tokens[0].normalized, "hello");
        assert_eq!(tokens[1].normalized, "world");
        assert_eq!(tokens[0].text, "Hello");
    }

    #[test]
    fn test_spans_round_trip() {
        // Information preserving: every token's text is the original slice.
        let text = "Añadir más café, por favor — gracias! 👍 ok";
        for token in tokenize(text, None) {
            assert_eq!(&text[token.start..token.end], token.text);
        }
    }

    #[test]
    fn test_emoji_is_atomic() {
        let tokens = tokenize("nice👍work", None);
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["nice", "👍", "work"]);
    }

    #[test]
    fn test_adjacent_emoji() {
        let tokens = tokenize("🎉🎉", None);
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].text, "🎉");
        assert_eq!(tokens[1].text, "🎉");
    }

    #[test]
    fn test_restartable() {
        let a = tokenize("one two three", None);
        let b = tokenize("one two three", None);
        assert_eq!(a, b);
    }

    #[test]
    fn test_general_punctuation_breaks() {
        // EN DASH (U+2013) sits in the 0x2000..=0x2BFF block.
        let tokens = tokenize("pages 3–4", None);
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["pages", "3", "4"]);
    }

    #[test]
    fn test_accented_letters_accumulate() {
        let tokens = tokenize("café sí", None);
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["café", "sí"]);
        assert_eq!(tokens[1].normalized, "sí");
    }
}
