// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Text normalization into stemmed token streams

use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;
use std::fmt;
use stop_words::LANGUAGE;

/// Upper bound on re-stemming a token before accepting the result
const MAX_STEM_PASSES: usize = 8;

/// Lowercases, tokenizes, drops stop words and stems.
///
/// Stemming is repeated until the stem no longer changes, which makes
/// `preprocess` idempotent over its own rendered output.
pub struct Preprocessor {
    word: Regex,
    stop_words: HashSet<String>,
    stemmer: Stemmer,
}

impl Preprocessor {
    pub fn new() -> Self {
        let stop_words = stop_words::get(LANGUAGE::English)
            .iter()
            .map(|w| w.to_string().to_lowercase())
            .collect();

        Self {
            word: Regex::new(r"[\p{L}\p{N}]+").expect("word pattern is valid"),
            stop_words,
            stemmer: Stemmer::create(Algorithm::English),
        }
    }

    pub fn is_stop_word(&self, token: &str) -> bool {
        self.stop_words.contains(token)
    }

    /// Stem to a fixed point
    pub fn stem(&self, token: &str) -> String {
        let mut current = token.to_string();
        for _ in 0..MAX_STEM_PASSES {
            let next = self.stemmer.stem(&current).into_owned();
            if next == current {
                break;
            }
            current = next;
        }
        current
    }

    /// Normalize raw text into an ordered stream of stems
    pub fn preprocess(&self, text: &str) -> Vec<String> {
        let lower = text.to_lowercase();
        self.word
            .find_iter(&lower)
            .map(|m| m.as_str())
            .filter(|token| !self.is_stop_word(token))
            .map(|token| self.stem(token))
            .filter(|stem| !stem.is_empty() && !self.is_stop_word(stem))
            .collect()
    }

    /// Preprocess and join into a single whitespace-separated string
    pub fn preprocess_to_string(&self, text: &str) -> String {
        render(&self.preprocess(text))
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Preprocessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Preprocessor")
            .field("stop_words", &self.stop_words.len())
            .field("stemmer", &"english")
            .finish()
    }
}

/// Render a token stream back to text
pub fn render(tokens: &[String]) -> String {
    tokens.join(" ")
}
