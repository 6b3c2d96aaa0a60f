//! New-name extraction for profile edits

use once_cell::sync::Lazy;
use ops_assistant_text_processing::matching::Normalized;
use regex::Regex;

const MAX_NAME_CHARS: usize = 50;

/// "change my name to X" / "change my username to X" set both fields
static BOTH_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:change|update|set)\s+my\s+(?:user\s*)?name\s+to\s+(.+)$").unwrap()
});

static DISPLAY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:change|update|set)\s+(?:my\s+|the\s+)?display\s*name\s+to\s+(.+)$")
        .unwrap()
});

static USERNAME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:change|update|set)\s+(?:the\s+)?user\s*name\s+to\s+(.+)$").unwrap()
});

static ZH_DISPLAY_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"显示名(?:称)?(?:改)?(?:为|成)\s*(.+)$").unwrap());

static ZH_BOTH_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:名字|用户名)(?:改)?(?:为|成)\s*(.+)$").unwrap());

/// Words that mark a sentence rather than a bare name
const POLITENESS_MARKERS: &[&str] = &[
    "please", "thanks", "thank", "hi", "hello", "hey", "pls", "can", "could", "would",
];
const ZH_POLITENESS_MARKERS: &[&str] = &["请", "谢谢", "麻烦", "你好"];

/// Which profile fields a message asks to change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameChange {
    pub username: Option<String>,
    pub display_name: Option<String>,
}

impl NameChange {
    fn both(name: String) -> Self {
        Self {
            username: Some(name.clone()),
            display_name: Some(name),
        }
    }
}

/// Name from an explicit "change ... to X" sentence
pub fn extract_explicit(message: &str) -> Option<NameChange> {
    if let Some(name) =
        capture(&DISPLAY_PATTERN, message).or_else(|| capture(&ZH_DISPLAY_PATTERN, message))
    {
        return Some(NameChange {
            username: None,
            display_name: Some(name),
        });
    }
    if let Some(name) =
        capture(&BOTH_PATTERN, message).or_else(|| capture(&ZH_BOTH_PATTERN, message))
    {
        return Some(NameChange::both(name));
    }
    capture(&USERNAME_PATTERN, message).map(|name| NameChange {
        username: Some(name),
        display_name: None,
    })
}

/// Name from a reply to "what would you like your new name to be?"
///
/// Explicit sentences first, then a short bare name (three words or
/// fewer, no politeness markers) applied to both fields.
pub fn extract_reply(message: &str) -> Option<NameChange> {
    if let Some(change) = extract_explicit(message) {
        return Some(change);
    }

    let text = Normalized::new(message);
    if text.word_count() == 0 || text.word_count() > 3 {
        return None;
    }
    if text.has_any_word(POLITENESS_MARKERS) || text.contains_any(ZH_POLITENESS_MARKERS) {
        return None;
    }
    clean_name(message).map(NameChange::both)
}

fn capture(pattern: &Regex, message: &str) -> Option<String> {
    pattern
        .captures(message)
        .and_then(|c| c.get(1))
        .and_then(|m| clean_name(m.as_str()))
}

fn clean_name(raw: &str) -> Option<String> {
    let name = raw
        .trim()
        .trim_matches(|c: char| matches!(c, '"' | '\'' | '“' | '”' | '「' | '」'))
        .trim_end_matches(|c: char| matches!(c, '.' | '!' | '?' | '。' | '！' | '？'))
        .trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_CHARS {
        return None;
    }
    Some(name.to_string())
}
