//! Data query service
//!
//! Filters one record category with the subset of the entity filter that
//! applies to it, truncates to the category's page size and renders the
//! category template. Records are loosely typed JSON; a missing field
//! renders as "N/A" and never matches a filter.

use chrono::NaiveDate;
use ops_assistant_config::{constants::query as defaults, QueryConfig};
use ops_assistant_core::{DataSources, EntityFilter, Intent, Record};
use ops_assistant_text_processing::entities::{format_record_date, parse_date};
use serde_json::Value;

/// Reply when a query matches nothing
pub const NO_DATA_MESSAGE: &str = "No data available for the given criteria.";

const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PageSize {
    Small,
    Large,
}

/// Entity filter fields a category honours
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FilterField {
    Date,
    Amount,
    Id,
    Agent,
    Email,
    Status,
}

/// Rendering and filtering rules for one record category
struct CategorySpec {
    intent: Intent,
    title: &'static str,
    page_size: PageSize,
    filters: &'static [FilterField],
    agent_keys: &'static [&'static str],
    /// (label, candidate keys) rendered per record
    columns: &'static [(&'static str, &'static [&'static str])],
}

const ID_KEYS: &[&str] = &["id", "ref", "reference"];
const DATE_KEYS: &[&str] = &["date", "createdAt", "time", "timestamp"];
const AMOUNT_KEYS: &[&str] = &["amount", "value", "total"];
const EMAIL_KEYS: &[&str] = &["email"];
const STATUS_KEYS: &[&str] = &["status"];

const CATEGORIES: &[CategorySpec] = &[
    CategorySpec {
        intent: Intent::BankIssues,
        title: "Bank Issues",
        page_size: PageSize::Small,
        filters: &[FilterField::Date, FilterField::Id, FilterField::Agent, FilterField::Status],
        agent_keys: &["handler", "agent", "assignedTo"],
        columns: &[
            ("Date", DATE_KEYS),
            ("Bank", &["bank", "bankName"]),
            ("Issue", &["issue", "description", "title"]),
            ("Status", STATUS_KEYS),
            ("Handler", &["handler", "agent", "assignedTo"]),
        ],
    },
    CategorySpec {
        intent: Intent::FollowUp,
        title: "Follow-ups",
        page_size: PageSize::Small,
        filters: &[FilterField::Date, FilterField::Id, FilterField::Agent, FilterField::Status],
        agent_keys: &["agent", "handler", "customer"],
        columns: &[
            ("Date", DATE_KEYS),
            ("Customer", &["customer", "name"]),
            ("Note", &["note", "notes", "description"]),
            ("Status", STATUS_KEYS),
            ("Agent", &["agent", "handler"]),
        ],
    },
    CategorySpec {
        intent: Intent::StockMail,
        title: "Stock Mail",
        page_size: PageSize::Small,
        filters: &[FilterField::Date, FilterField::Id, FilterField::Agent, FilterField::Status],
        agent_keys: &["sender", "agent", "recipient"],
        columns: &[
            ("Date", DATE_KEYS),
            ("Subject", &["subject", "title"]),
            ("Sender", &["sender", "agent"]),
            ("Status", STATUS_KEYS),
        ],
    },
    CategorySpec {
        intent: Intent::LastIn,
        title: "Last In",
        page_size: PageSize::Large,
        filters: &[FilterField::Date, FilterField::Agent, FilterField::Id],
        agent_keys: &["agent", "name"],
        columns: &[
            ("Agent", &["agent", "name"]),
            ("Date", DATE_KEYS),
            ("Device", &["device", "deviceName"]),
        ],
    },
    CategorySpec {
        intent: Intent::LastOut,
        title: "Last Out",
        page_size: PageSize::Large,
        filters: &[FilterField::Date, FilterField::Agent, FilterField::Id],
        agent_keys: &["agent", "name"],
        columns: &[
            ("Agent", &["agent", "name"]),
            ("Date", DATE_KEYS),
            ("Device", &["device", "deviceName"]),
        ],
    },
    CategorySpec {
        intent: Intent::Transactions,
        title: "Transactions",
        page_size: PageSize::Large,
        filters: &[
            FilterField::Date,
            FilterField::Amount,
            FilterField::Id,
            FilterField::Agent,
            FilterField::Email,
            FilterField::Status,
        ],
        agent_keys: &["agent", "customer", "name"],
        columns: &[
            ("Date", DATE_KEYS),
            ("Amount", AMOUNT_KEYS),
            ("Bank", &["bank", "bankName"]),
            ("Status", STATUS_KEYS),
            ("Agent", &["agent", "customer"]),
        ],
    },
    CategorySpec {
        intent: Intent::COperations,
        title: "C-Operations",
        page_size: PageSize::Small,
        filters: &[
            FilterField::Date,
            FilterField::Amount,
            FilterField::Id,
            FilterField::Agent,
            FilterField::Status,
        ],
        agent_keys: &["agent", "handler", "operator"],
        columns: &[
            ("Date", DATE_KEYS),
            ("Operation", &["operation", "type", "description"]),
            ("Amount", AMOUNT_KEYS),
            ("Status", STATUS_KEYS),
            ("Agent", &["agent", "operator"]),
        ],
    },
    CategorySpec {
        intent: Intent::AgentList,
        title: "Agents",
        page_size: PageSize::Large,
        filters: &[FilterField::Agent, FilterField::Email, FilterField::Status, FilterField::Id],
        agent_keys: &["name", "username"],
        columns: &[
            ("Name", &["name", "username"]),
            ("Email", EMAIL_KEYS),
            ("Role", &["role", "team"]),
            ("Status", STATUS_KEYS),
        ],
    },
    CategorySpec {
        intent: Intent::WealthList,
        title: "Wealth",
        page_size: PageSize::Small,
        filters: &[FilterField::Date, FilterField::Amount, FilterField::Agent, FilterField::Id],
        agent_keys: &["client", "name", "agent"],
        columns: &[
            ("Client", &["client", "name"]),
            ("Amount", AMOUNT_KEYS),
            ("Product", &["product", "type"]),
            ("Date", DATE_KEYS),
        ],
    },
    CategorySpec {
        intent: Intent::DailyReport,
        title: "Daily Reports",
        page_size: PageSize::Small,
        filters: &[FilterField::Date, FilterField::Agent, FilterField::Id],
        agent_keys: &["agent", "author", "submittedBy"],
        columns: &[
            ("Date", DATE_KEYS),
            ("Agent", &["agent", "author", "submittedBy"]),
            ("Summary", &["summary", "report", "notes"]),
        ],
    },
];

/// Record keys answering a field query
const FIELD_KEYS: &[(&str, &[&str])] = &[
    ("device", &["device", "deviceName"]),
    ("password", &["password"]),
    ("handler", &["handler", "agent", "assignedTo"]),
    ("status", STATUS_KEYS),
    ("bank", &["bank", "bankName"]),
    ("amount", AMOUNT_KEYS),
];

/// Outcome of a category query
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    /// Matching records after truncation to the page size
    pub records: Vec<Record>,
    /// Matches before truncation
    pub total: usize,
    pub message: String,
}

impl QueryResult {
    fn empty() -> Self {
        Self {
            records: Vec::new(),
            total: 0,
            message: NO_DATA_MESSAGE.to_string(),
        }
    }

    pub fn has_data(&self) -> bool {
        self.total > 0
    }
}

pub struct DataQueryService {
    small_page_size: usize,
    large_page_size: usize,
}

impl Default for DataQueryService {
    fn default() -> Self {
        Self {
            small_page_size: defaults::SMALL_PAGE_SIZE,
            large_page_size: defaults::LARGE_PAGE_SIZE,
        }
    }
}

impl DataQueryService {
    pub fn new(config: &QueryConfig) -> Self {
        Self {
            small_page_size: config.small_page_size,
            large_page_size: config.large_page_size,
        }
    }

    /// Query one category; non-data intents yield the no-data result
    pub fn query(
        &self,
        intent: Intent,
        sources: &DataSources,
        filter: &EntityFilter,
    ) -> QueryResult {
        let Some(spec) = category(intent) else {
            return QueryResult::empty();
        };

        let matched = filter_records(spec, sources.records_for(intent), filter);
        let total = matched.len();
        tracing::debug!(intent = %intent, total, "Queried records");

        if total == 0 {
            return QueryResult::empty();
        }

        let limit = match spec.page_size {
            PageSize::Small => self.small_page_size,
            PageSize::Large => self.large_page_size,
        };
        let records: Vec<Record> = matched.into_iter().take(limit).cloned().collect();

        let message = match filter.field.as_deref() {
            Some(field) => render_field_answer(spec, &records, total, field),
            None => render_listing(spec, &records, total),
        };

        QueryResult {
            records,
            total,
            message,
        }
    }

    pub fn query_bank_issues(&self, sources: &DataSources, filter: &EntityFilter) -> QueryResult {
        self.query(Intent::BankIssues, sources, filter)
    }

    /// Most recent bank issue on a day; the last matching record in input
    /// order wins
    pub fn latest_bank_issue<'a>(
        &self,
        sources: &'a DataSources,
        date: NaiveDate,
    ) -> Option<&'a Record> {
        let filter = EntityFilter {
            date: Some(format_record_date(date)),
            ..Default::default()
        };
        let spec = category(Intent::BankIssues)?;
        filter_records(spec, &sources.bank_issues, &filter).pop()
    }

    /// One record rendered with its category's columns
    pub fn describe(&self, intent: Intent, record: &Record) -> String {
        match category(intent) {
            Some(spec) => render_record(spec, record),
            None => record.to_string(),
        }
    }
}

fn category(intent: Intent) -> Option<&'static CategorySpec> {
    CATEGORIES.iter().find(|c| c.intent == intent)
}

fn filter_records<'a>(
    spec: &CategorySpec,
    records: &'a [Record],
    filter: &EntityFilter,
) -> Vec<&'a Record> {
    records
        .iter()
        .filter(|record| spec.filters.iter().all(|f| matches_field(spec, record, *f, filter)))
        .collect()
}

fn matches_field(
    spec: &CategorySpec,
    record: &Record,
    field: FilterField,
    filter: &EntityFilter,
) -> bool {
    match field {
        FilterField::Date => filter.date.as_deref().map_or(true, |date| {
            field_str(record, DATE_KEYS).map_or(false, |value| date_matches(&value, date))
        }),
        FilterField::Amount => filter.amount.as_deref().map_or(true, |amount| {
            field_str(record, AMOUNT_KEYS).map_or(false, |value| amount_matches(&value, amount))
        }),
        FilterField::Id => filter.id.as_deref().map_or(true, |id| {
            field_str(record, ID_KEYS).map_or(false, |value| value.trim_start_matches('#') == id)
        }),
        FilterField::Agent => filter.agent.as_deref().map_or(true, |agent| {
            let agent = agent.to_lowercase();
            spec.agent_keys
                .iter()
                .filter_map(|k| field_str(record, &[*k]))
                .any(|value| value.to_lowercase().contains(&agent))
        }),
        FilterField::Email => filter.email.as_deref().map_or(true, |email| {
            field_str(record, EMAIL_KEYS).map_or(false, |value| value.eq_ignore_ascii_case(email))
        }),
        FilterField::Status => filter.status.as_deref().map_or(true, |status| {
            field_str(record, STATUS_KEYS).map_or(false, |value| value.eq_ignore_ascii_case(status))
        }),
    }
}

/// Record dates may carry a time suffix or be ISO formatted; compare the
/// normalised leading date
fn date_matches(value: &str, wanted: &str) -> bool {
    let leading = value
        .split(|c: char| c.is_whitespace() || c == 'T' || c == ',')
        .next()
        .unwrap_or(value);
    match parse_date(leading) {
        Some(date) => format_record_date(date) == wanted,
        None => value.starts_with(wanted),
    }
}

fn amount_matches(value: &str, wanted: &str) -> bool {
    let clean = |s: &str| -> String {
        s.chars()
            .filter(|c| c.is_ascii_digit() || *c == '.')
            .collect()
    };
    match (clean(value).parse::<f64>(), clean(wanted).parse::<f64>()) {
        (Ok(a), Ok(b)) => (a - b).abs() < 0.005,
        _ => value == wanted,
    }
}

/// First present key rendered as text
fn field_str(record: &Record, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match record.get(*key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

fn record_label(record: &Record) -> String {
    match field_str(record, ID_KEYS) {
        Some(id) => format!("#{}", id.trim_start_matches('#')),
        None => "#N/A".to_string(),
    }
}

fn render_record(spec: &CategorySpec, record: &Record) -> String {
    let columns: Vec<String> = spec
        .columns
        .iter()
        .map(|(label, keys)| {
            format!(
                "{}: {}",
                label,
                field_str(record, keys).unwrap_or_else(|| NOT_AVAILABLE.to_string())
            )
        })
        .collect();
    format!("{} | {}", record_label(record), columns.join(" | "))
}

fn render_listing(spec: &CategorySpec, records: &[Record], total: usize) -> String {
    let lines: Vec<String> = records
        .iter()
        .enumerate()
        .map(|(i, r)| format!("{}. {}", i + 1, render_record(spec, r)))
        .collect();
    format!(
        "Here are the {} records. Showing {} of {}:\n{}",
        spec.title,
        records.len(),
        total,
        lines.join("\n")
    )
}

fn render_field_answer(
    spec: &CategorySpec,
    records: &[Record],
    total: usize,
    field: &str,
) -> String {
    let keys = FIELD_KEYS
        .iter()
        .find(|(name, _)| *name == field)
        .map(|(_, keys)| *keys)
        .unwrap_or(&[]);
    let lines: Vec<String> = records
        .iter()
        .enumerate()
        .map(|(i, r)| {
            format!(
                "{}. {}: {}",
                i + 1,
                record_label(r),
                field_str(r, keys).unwrap_or_else(|| NOT_AVAILABLE.to_string())
            )
        })
        .collect();
    format!(
        "{} {} for {} records. Showing {} of {}:\n{}",
        capitalize(field),
        if records.len() == 1 { "value" } else { "values" },
        spec.title,
        records.len(),
        total,
        lines.join("\n")
    )
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
