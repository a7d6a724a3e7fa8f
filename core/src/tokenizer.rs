use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

lazy_static! {
    static ref RE: Regex = Regex::new(r"\S+").expect("valid regex");
}

/// Characters stripped from both ends of every raw token.
pub const DEFAULT_TRIM_CHARS: &str = ".,:;'\"()[]{}|\\/";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenizerConfig {
    pub trim_chars: String,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self { trim_chars: DEFAULT_TRIM_CHARS.to_string() }
    }
}

impl TokenizerConfig {
    pub fn with_trim_chars(trim_chars: impl Into<String>) -> Self {
        Self { trim_chars: trim_chars.into() }
    }

    /// Trim leading and trailing trim-set characters. Case is left alone.
    pub fn normalize<'a>(&self, raw: &'a str) -> &'a str {
        raw.trim_matches(|c: char| self.trim_chars.contains(c))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub word: String,
    /// Cursor value before the raw token was consumed.
    pub offset: usize,
}

/// Tokenize text into (word, offset) pairs.
///
/// The cursor starts at 0 and advances by the raw token's byte length plus one
/// separator after every token, the last one included. Runs of whitespace count
/// as a single separator. A token made only of trim characters is emitted as
/// the empty word.
pub fn tokenize(text: &str, config: &TokenizerConfig) -> Vec<Token> {
    let mut cursor = 0usize;
    let mut tokens = Vec::new();
    for mat in RE.find_iter(text) {
        let raw = mat.as_str();
        let offset = cursor;
        cursor += raw.len() + 1;
        let word = config.normalize(raw);
        tokens.push(Token { word: word.to_string(), offset });
    }
    tokens
}

/// Group token offsets by word, keeping words in order of first appearance and
/// offsets in scan order.
pub fn group_positions(tokens: Vec<Token>) -> Vec<(String, Vec<usize>)> {
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut grouped: Vec<(String, Vec<usize>)> = Vec::new();
    for Token { word, offset } in tokens {
        match slots.get(&word) {
            Some(&slot) => grouped[slot].1.push(offset),
            None => {
                slots.insert(word.clone(), grouped.len());
                grouped.push((word, vec![offset]));
            }
        }
    }
    grouped
}
