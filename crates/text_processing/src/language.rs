//! Script-based language detection
//!
//! Counts characters per Unicode block and picks the dominant non-Latin
//! script. Kana anywhere means Japanese, since Japanese text mixes kana with
//! CJK ideographs. Anything without a recognised script is English.

use ops_assistant_core::Language;

use crate::matching::is_cjk;

#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptDetector;

impl ScriptDetector {
    pub fn new() -> Self {
        Self
    }

    pub fn detect(&self, text: &str) -> Language {
        let mut han = 0usize;
        let mut kana = 0usize;
        let mut hangul = 0usize;
        let mut thai = 0usize;
        let mut arabic = 0usize;

        for c in text.chars() {
            match c {
                '\u{3040}'..='\u{30FF}' | '\u{31F0}'..='\u{31FF}' => kana += 1,
                '\u{AC00}'..='\u{D7AF}' | '\u{1100}'..='\u{11FF}' | '\u{3130}'..='\u{318F}' => {
                    hangul += 1
                }
                '\u{0E00}'..='\u{0E7F}' => thai += 1,
                '\u{0600}'..='\u{06FF}' | '\u{0750}'..='\u{077F}' => arabic += 1,
                c if is_cjk(c) => han += 1,
                _ => {}
            }
        }

        if kana > 0 {
            return Language::Japanese;
        }

        [
            (han, Language::Chinese),
            (hangul, Language::Korean),
            (thai, Language::Thai),
            (arabic, Language::Arabic),
        ]
        .into_iter()
        .filter(|(count, _)| *count > 0)
        .max_by_key(|(count, _)| *count)
        .map(|(_, lang)| lang)
        .unwrap_or(Language::English)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripts() {
        let detector = ScriptDetector::new();
        assert_eq!(detector.detect("hello there"), Language::English);
        assert_eq!(detector.detect("你好，我需要帮助"), Language::Chinese);
        assert_eq!(detector.detect("こんにちは世界"), Language::Japanese);
        assert_eq!(detector.detect("안녕하세요"), Language::Korean);
        assert_eq!(detector.detect("สวัสดีครับ"), Language::Thai);
        assert_eq!(detector.detect("مرحبا"), Language::Arabic);
    }

    #[test]
    fn test_mixed_text_uses_dominant_script() {
        let detector = ScriptDetector::new();
        assert_eq!(detector.detect("DBS 银行 limit"), Language::Chinese);
        assert_eq!(detector.detect(""), Language::English);
    }
}
