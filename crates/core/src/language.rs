//! Languages the assistant can recognise
//!
//! Only English and Chinese have response sets; the remaining variants exist
//! so the language detector can name what it saw.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    Chinese,
    Japanese,
    Korean,
    Thai,
    Arabic,
}

impl Language {
    /// ISO 639-1 code
    pub fn code(&self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Chinese => "zh",
            Self::Japanese => "ja",
            Self::Korean => "ko",
            Self::Thai => "th",
            Self::Arabic => "ar",
        }
    }

    /// English display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::English => "English",
            Self::Chinese => "Chinese",
            Self::Japanese => "Japanese",
            Self::Korean => "Korean",
            Self::Thai => "Thai",
            Self::Arabic => "Arabic",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_lowercase().as_str() {
            "en" => Some(Self::English),
            "zh" => Some(Self::Chinese),
            "ja" => Some(Self::Japanese),
            "ko" => Some(Self::Korean),
            "th" => Some(Self::Thai),
            "ar" => Some(Self::Arabic),
            _ => None,
        }
    }

    /// Whether a dedicated Chinese response set should be used
    pub fn is_chinese(&self) -> bool {
        matches!(self, Self::Chinese)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_round_trip() {
        for lang in [Language::English, Language::Chinese, Language::Thai] {
            assert_eq!(Language::from_code(lang.code()), Some(lang));
        }
        assert_eq!(Language::from_code("xx"), None);
    }
}
