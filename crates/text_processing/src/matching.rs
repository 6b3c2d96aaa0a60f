//! Keyword matching helpers
//!
//! Latin keywords match case-insensitively as substrings of the message.
//! Non-Latin keywords (Chinese etc.) match as exact substrings of the
//! original text.

use unicode_segmentation::UnicodeSegmentation;

/// A message prepared once for repeated keyword checks
#[derive(Debug, Clone)]
pub struct Normalized<'a> {
    pub original: &'a str,
    pub lower: String,
}

impl<'a> Normalized<'a> {
    pub fn new(original: &'a str) -> Self {
        Self {
            original,
            lower: original.to_lowercase(),
        }
    }

    /// Substring match with the Latin/non-Latin rule
    pub fn contains(&self, keyword: &str) -> bool {
        if keyword.is_ascii() {
            self.lower.contains(&keyword.to_lowercase())
        } else {
            self.original.contains(keyword)
        }
    }

    pub fn contains_any(&self, keywords: &[&str]) -> bool {
        keywords.iter().any(|k| self.contains(k))
    }

    /// Whole-word match for short Latin tokens ("hi" must not match "this")
    pub fn has_word(&self, word: &str) -> bool {
        let word = word.to_lowercase();
        self.lower.unicode_words().any(|w| w == word)
    }

    pub fn has_any_word(&self, words: &[&str]) -> bool {
        words.iter().any(|w| self.has_word(w))
    }

    pub fn word_count(&self) -> usize {
        self.original.unicode_words().count()
    }
}

/// Whether the character falls in a CJK ideograph block
pub fn is_cjk(c: char) -> bool {
    matches!(c,
        '\u{4E00}'..='\u{9FFF}'
        | '\u{3400}'..='\u{4DBF}'
        | '\u{F900}'..='\u{FAFF}'
        | '\u{20000}'..='\u{2A6DF}')
}
