//! Canned phrase translation
//!
//! `translate (to)? LANG: TEXT` requests are answered from a small offline
//! phrase table. Anything outside the table gets a templated placeholder;
//! no translation service is called.

use once_cell::sync::Lazy;
use regex::Regex;

static REQUEST_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:translate|翻译)\s+(?:(?:to|into)\s+)?([a-z\p{Han}]+)\s*[:：]\s*(.+?)\s*$")
        .unwrap()
});

/// Parsed `translate LANG: TEXT` request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRequest {
    pub language: String,
    pub text: String,
}

struct LanguageTable {
    name: &'static str,
    aliases: &'static [&'static str],
    phrases: &'static [(&'static str, &'static str)],
}

const TABLES: &[LanguageTable] = &[
    LanguageTable {
        name: "Chinese",
        aliases: &["chinese", "mandarin", "zh", "中文", "华语"],
        phrases: &[
            ("hello", "你好"),
            ("thank you", "谢谢"),
            ("thanks", "谢谢"),
            ("goodbye", "再见"),
            ("good morning", "早上好"),
            ("how are you", "你好吗"),
            ("sorry", "对不起"),
            ("yes", "是"),
            ("no", "不是"),
        ],
    },
    LanguageTable {
        name: "Malay",
        aliases: &["malay", "bahasa", "ms", "马来文"],
        phrases: &[
            ("hello", "helo"),
            ("thank you", "terima kasih"),
            ("thanks", "terima kasih"),
            ("goodbye", "selamat tinggal"),
            ("good morning", "selamat pagi"),
            ("how are you", "apa khabar"),
            ("sorry", "maaf"),
            ("yes", "ya"),
            ("no", "tidak"),
        ],
    },
    LanguageTable {
        name: "Spanish",
        aliases: &["spanish", "es", "espanol"],
        phrases: &[
            ("hello", "hola"),
            ("thank you", "gracias"),
            ("thanks", "gracias"),
            ("goodbye", "adiós"),
            ("good morning", "buenos días"),
            ("how are you", "¿cómo estás?"),
            ("sorry", "lo siento"),
            ("yes", "sí"),
            ("no", "no"),
        ],
    },
    LanguageTable {
        name: "Japanese",
        aliases: &["japanese", "ja", "日文", "日语"],
        phrases: &[
            ("hello", "こんにちは"),
            ("thank you", "ありがとう"),
            ("thanks", "ありがとう"),
            ("goodbye", "さようなら"),
            ("good morning", "おはようございます"),
            ("sorry", "すみません"),
        ],
    },
    LanguageTable {
        name: "English",
        aliases: &["english", "en", "英文", "英语"],
        phrases: &[
            ("你好", "hello"),
            ("谢谢", "thank you"),
            ("再见", "goodbye"),
            ("早上好", "good morning"),
            ("对不起", "sorry"),
        ],
    },
];

#[derive(Debug, Clone, Copy, Default)]
pub struct PhraseTranslator;

impl PhraseTranslator {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, message: &str) -> Option<TranslationRequest> {
        let captures = REQUEST_PATTERN.captures(message)?;
        Some(TranslationRequest {
            language: captures.get(1)?.as_str().to_lowercase(),
            text: captures.get(2)?.as_str().to_string(),
        })
    }

    /// Offline translation, or `None` when the phrase is not in the table
    pub fn lookup(&self, request: &TranslationRequest) -> Option<&'static str> {
        let table = find_table(&request.language)?;
        let phrase = request
            .text
            .trim()
            .trim_end_matches(|c: char| c.is_ascii_punctuation())
            .to_lowercase();
        table
            .phrases
            .iter()
            .find(|(source, _)| *source == phrase)
            .map(|(_, target)| *target)
    }

    /// User-facing reply for a request
    pub fn respond(&self, request: &TranslationRequest) -> String {
        let language = find_table(&request.language)
            .map(|t| t.name.to_string())
            .unwrap_or_else(|| capitalize(&request.language));

        match self.lookup(request) {
            Some(translation) => format!("\"{}\" in {}: {}", request.text, language, translation),
            None => format!(
                "[{} translation] \"{}\"\n\
                 I can only translate common phrases offline. A translation API is not connected, \
                 so please use a dedicated translator for full sentences.",
                language, request.text
            ),
        }
    }
}

fn find_table(language: &str) -> Option<&'static LanguageTable> {
    let language = language.to_lowercase();
    TABLES
        .iter()
        .find(|t| t.aliases.iter().any(|a| *a == language))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
