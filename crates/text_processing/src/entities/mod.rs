//! Entity Extraction
//!
//! Pulls structured values out of free text for the data query layer:
//! - Dates (ISO, slash dates, today/yesterday, 今天/昨天)
//! - Amounts (currency-prefixed or two-decimal numbers)
//! - Record ids
//! - Capitalised agent/handler names
//! - Email addresses
//! - Record statuses
//! - Requested field ("what device", "what status", ...)
//!
//! Each extractor runs its own regex and returns the first match. They do
//! not coordinate, so a number inside a date can also come back as an
//! amount.
//!
//! # Example
//!
//! ```
//! use ops_assistant_text_processing::entities::EntityExtractor;
//!
//! let extractor = EntityExtractor::new();
//! assert_eq!(extractor.extract_id("show issue #42").as_deref(), Some("42"));
//! assert_eq!(extractor.extract_email("mail ops@bank.com").as_deref(), Some("ops@bank.com"));
//! ```

use chrono::{Duration, NaiveDate};
use once_cell::sync::Lazy;
use ops_assistant_core::EntityFilter;
use regex::Regex;

static ISO_DATE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b").unwrap());

static SLASH_DATE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})/(\d{1,2})/(\d{4})\b").unwrap());

static RELATIVE_DATE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(today|yesterday)\b|(今天|昨天)").unwrap());

static AMOUNT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:s\$|\$|\brm|\busd|\bsgd|\bmyr|\bamount(?:\s+of)?)\s*(\d[\d,]*(?:\.\d+)?)")
        .unwrap()
});

static DECIMAL_AMOUNT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d[\d,]*\.\d{2})\b").unwrap());

static ID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:\bid\b|#|\bno\.?|\bnumber\b|\bref\b)\s*:?\s*(\d+)").unwrap()
});

static AGENT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?i:by|for|agent|handler|from|of)\s+([A-Z][a-z]+(?:\s+[A-Z][a-z]+)?)").unwrap()
});

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}\b").unwrap());

static STATUS_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(pending|resolved|completed|in progress|open|closed|failed|approved|rejected)\b",
    )
    .unwrap()
});

static CODE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{6})\b").unwrap());

/// Capitalised words that follow "for"/"of" without being names
const NAME_STOPWORDS: &[&str] = &[
    "Today", "Yesterday", "Me", "The", "This", "That", "January", "February", "March", "April",
    "May", "June", "July", "August", "September", "October", "November", "December", "Monday",
    "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday",
];

/// Field-query phrases, checked in order
const FIELD_QUERIES: &[(&[&str], &str)] = &[
    (&["what device", "which device"], "device"),
    (&["password"], "password"),
    (&["handler", "who handled", "who is handling"], "handler"),
    (&["what status", "status of"], "status"),
    (&["which bank", "what bank"], "bank"),
    (&["what amount", "how much"], "amount"),
];

#[derive(Debug, Clone, Default)]
pub struct EntityExtractor;

impl EntityExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Raw date reference as written in the message
    pub fn extract_date(&self, text: &str) -> Option<String> {
        ISO_DATE_PATTERN
            .find(text)
            .or_else(|| SLASH_DATE_PATTERN.find(text))
            .or_else(|| RELATIVE_DATE_PATTERN.find(text))
            .map(|m| m.as_str().to_string())
    }

    pub fn extract_amount(&self, text: &str) -> Option<String> {
        AMOUNT_PATTERN
            .captures(text)
            .or_else(|| DECIMAL_AMOUNT_PATTERN.captures(text))
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().replace(',', ""))
    }

    pub fn extract_id(&self, text: &str) -> Option<String> {
        ID_PATTERN
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    }

    /// Capitalised name following by/for/agent/handler/from/of
    pub fn extract_agent(&self, text: &str) -> Option<String> {
        AGENT_PATTERN
            .captures_iter(text)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str())
            .find(|name| {
                let first = name.split_whitespace().next().unwrap_or(name);
                !NAME_STOPWORDS.contains(&first)
            })
            .map(|name| name.to_string())
    }

    pub fn extract_email(&self, text: &str) -> Option<String> {
        EMAIL_PATTERN.find(text).map(|m| m.as_str().to_lowercase())
    }

    pub fn extract_status(&self, text: &str) -> Option<String> {
        STATUS_PATTERN
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_lowercase())
    }

    /// Canonical field name the message asks about, first match wins
    pub fn extract_field_query(&self, text: &str) -> Option<String> {
        let lower = text.to_lowercase();
        FIELD_QUERIES
            .iter()
            .find(|(phrases, _)| phrases.iter().any(|p| lower.contains(p)))
            .map(|(_, field)| field.to_string())
    }

    /// Six-digit authenticator code
    pub fn extract_code(&self, text: &str) -> Option<String> {
        CODE_PATTERN
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    }

    /// Run every extractor; the date is normalised to `M/d/yyyy`
    pub fn extract_filter(&self, text: &str, today: NaiveDate) -> EntityFilter {
        let filter = EntityFilter {
            date: self
                .extract_date(text)
                .and_then(|raw| normalize_date(&raw, today)),
            amount: self.extract_amount(text),
            id: self.extract_id(text),
            agent: self.extract_agent(text),
            email: self.extract_email(text),
            field: self.extract_field_query(text),
            status: self.extract_status(text),
        };
        tracing::trace!(?filter, "Extracted entity filter");
        filter
    }
}

/// Format a date the way records store it (`M/d/yyyy`, no padding)
pub fn format_record_date(date: NaiveDate) -> String {
    date.format("%-m/%-d/%Y").to_string()
}

/// Normalise a raw date reference into `M/d/yyyy`
///
/// Slash dates are read month-first unless the first part cannot be a
/// month, in which case they are read day-first.
pub fn normalize_date(raw: &str, today: NaiveDate) -> Option<String> {
    let raw = raw.trim();
    let date = match raw.to_lowercase().as_str() {
        "today" | "今天" => Some(today),
        "yesterday" | "昨天" => Some(today - Duration::days(1)),
        _ => parse_date(raw),
    }?;
    Some(format_record_date(date))
}

/// Parse an explicit ISO or slash date; relative words are not handled
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    if let Some(c) = ISO_DATE_PATTERN.captures(raw) {
        let (y, m, d) = (c[1].parse().ok()?, c[2].parse().ok()?, c[3].parse().ok()?);
        return NaiveDate::from_ymd_opt(y, m, d);
    }
    if let Some(c) = SLASH_DATE_PATTERN.captures(raw) {
        let (a, b, y): (u32, u32, i32) =
            (c[1].parse().ok()?, c[2].parse().ok()?, c[3].parse().ok()?);
        return NaiveDate::from_ymd_opt(y, a, b).or_else(|| NaiveDate::from_ymd_opt(y, b, a));
    }
    None
}
