//! Text processing for the operations assistant
//!
//! This crate provides the deterministic, stateless text layers:
//! - **Entity Extraction**: dates, amounts, ids, names, emails, statuses
//! - **Intent Classification**: ordered bilingual keyword table
//! - **Language Detection**: Unicode block based script detection
//! - **Calculator**: whitelisted arithmetic evaluation
//! - **Translation**: canned phrase table with a placeholder fallback
//! - **Localization**: English to Chinese phrase substitution
//! - **Matching helpers**: word and substring keyword checks shared by the
//!   chat layers

pub mod calculator;
pub mod entities;
pub mod intent;
pub mod language;
pub mod localization;
pub mod matching;
pub mod translation;

pub use calculator::{Calculator, CalculatorError};
pub use entities::EntityExtractor;
pub use intent::{IntentRule, KeywordIntentClassifier};
pub use language::ScriptDetector;
pub use localization::localize_to_chinese;
pub use translation::{PhraseTranslator, TranslationRequest};
