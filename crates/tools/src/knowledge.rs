//! Bank knowledge base
//!
//! Static catalogue of banks with transfer limits, support contacts,
//! registration steps, common issues and scam advice. The built-in catalogue
//! is embedded at compile time; hosts may point `knowledge.catalogue_path` at
//! a YAML file with the same shape instead.
//!
//! Name resolution runs three tiers and stops at the first hit:
//! 1. Exact canonical key (case-insensitive)
//! 2. Alias containment in either direction
//! 3. Key containment in either direction
//!
//! Within a tier, catalogue order decides.

use std::path::Path;

use ops_assistant_config::KnowledgeConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use ops_assistant_text_processing::matching::Normalized;

const BUILTIN_CATALOGUE: &str = include_str!("../data/banks.yaml");

#[derive(Error, Debug)]
pub enum KnowledgeError {
    #[error("Failed to read catalogue {path}: {message}")]
    Io { path: String, message: String },

    #[error("Failed to parse catalogue: {0}")]
    Parse(String),

    #[error("Catalogue has no banks")]
    Empty,

    #[error("Duplicate bank key: {0}")]
    DuplicateKey(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransferLimits {
    #[serde(default)]
    pub daily: Option<String>,
    #[serde(default)]
    pub monthly: Option<String>,
    #[serde(default)]
    pub transfer_notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SupportContacts {
    #[serde(default)]
    pub hotline: Option<String>,
    #[serde(default)]
    pub overseas: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub hours: Option<String>,
}

/// One bank in the catalogue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankEntry {
    /// Canonical name, unique across the catalogue
    pub key: String,
    /// Display name
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub limits: TransferLimits,
    #[serde(default)]
    pub support: SupportContacts,
    #[serde(default)]
    pub registration: Vec<String>,
    #[serde(default)]
    pub common_issues: Vec<String>,
    #[serde(default)]
    pub scam_advice: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CatalogueFile {
    banks: Vec<BankEntry>,
}

/// What part of an entry a message asks about, in branch priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BankTopic {
    Contact,
    EmailTemplate,
    Registration,
    CommonIssues,
    DailyLimit,
    MonthlyLimit,
    Limits,
    Scam,
    Overview,
}

const TOPIC_KEYWORDS: &[(BankTopic, &[&str])] = &[
    (
        BankTopic::Contact,
        &["contact", "hotline", "customer service", "phone", "call", "number", "客服", "联系", "电话"],
    ),
    (BankTopic::EmailTemplate, &["email", "write to", "letter", "邮件"]),
    (
        BankTopic::Registration,
        &["register", "registration", "sign up", "signup", "open account", "activate", "注册", "开户"],
    ),
    (
        BankTopic::CommonIssues,
        &["issue", "problem", "error", "not working", "trouble", "问题", "故障"],
    ),
    (BankTopic::DailyLimit, &["daily", "per day", "each day", "每日", "每天"]),
    (BankTopic::MonthlyLimit, &["monthly", "per month", "每月"]),
    (BankTopic::Limits, &["limit", "transfer", "how much can", "限额", "转账"]),
    (BankTopic::Scam, &["scam", "fraud", "phishing", "suspicious", "诈骗", "骗"]),
];

impl BankTopic {
    /// First topic whose keywords appear in the message
    pub fn detect(message: &str) -> Self {
        let text = Normalized::new(message);
        TOPIC_KEYWORDS
            .iter()
            .find(|(_, keywords)| text.contains_any(keywords))
            .map(|(topic, _)| *topic)
            .unwrap_or(BankTopic::Overview)
    }
}

pub struct KnowledgeBase {
    banks: Vec<BankEntry>,
}

impl KnowledgeBase {
    /// The embedded catalogue
    pub fn builtin() -> Result<Self, KnowledgeError> {
        Self::from_yaml(BUILTIN_CATALOGUE)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, KnowledgeError> {
        let file: CatalogueFile =
            serde_yaml::from_str(yaml).map_err(|e| KnowledgeError::Parse(e.to_string()))?;
        Self::from_entries(file.banks)
    }

    pub fn from_entries(banks: Vec<BankEntry>) -> Result<Self, KnowledgeError> {
        if banks.is_empty() {
            return Err(KnowledgeError::Empty);
        }
        for (i, bank) in banks.iter().enumerate() {
            if banks[..i].iter().any(|b| b.key.eq_ignore_ascii_case(&bank.key)) {
                return Err(KnowledgeError::DuplicateKey(bank.key.clone()));
            }
        }
        Ok(Self { banks })
    }

    /// Load a catalogue file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, KnowledgeError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| KnowledgeError::Io {
            path: path.as_ref().display().to_string(),
            message: e.to_string(),
        })?;
        let kb = Self::from_yaml(&content)?;
        tracing::info!(
            banks = kb.banks.len(),
            path = %path.as_ref().display(),
            "Loaded bank catalogue"
        );
        Ok(kb)
    }

    /// Catalogue named by config, or the built-in one
    pub fn from_config(config: &KnowledgeConfig) -> Result<Self, KnowledgeError> {
        match &config.catalogue_path {
            Some(path) => Self::load(path),
            None => Self::builtin(),
        }
    }

    pub fn len(&self) -> usize {
        self.banks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.banks.is_empty()
    }

    /// Canonical names in catalogue order
    pub fn bank_names(&self) -> Vec<&str> {
        self.banks.iter().map(|b| b.key.as_str()).collect()
    }

    /// Resolve a bank name through the three matching tiers
    pub fn get_bank_info(&self, raw: &str) -> Option<&BankEntry> {
        let query = raw.trim().to_lowercase();
        if query.is_empty() {
            return None;
        }

        let contains_either = |candidate: &str| {
            let candidate = candidate.to_lowercase();
            candidate.contains(&query) || query.contains(&candidate)
        };

        self.banks
            .iter()
            .find(|b| b.key.to_lowercase() == query)
            .or_else(|| {
                self.banks
                    .iter()
                    .find(|b| b.aliases.iter().any(|a| contains_either(a)))
            })
            .or_else(|| self.banks.iter().find(|b| contains_either(&b.key)))
    }

    /// First key or alias mentioned in free text, in catalogue order
    pub fn mentioned_name(&self, message: &str) -> Option<&str> {
        let lower = message.to_lowercase();
        self.banks
            .iter()
            .flat_map(|b| std::iter::once(&b.key).chain(b.aliases.iter()))
            .find(|name| mentions(&lower, &name.to_lowercase()))
            .map(String::as_str)
    }

    /// Bank referenced anywhere in free text, resolved through the tiers
    pub fn find_in_message(&self, message: &str) -> Option<&BankEntry> {
        self.mentioned_name(message)
            .and_then(|name| self.get_bank_info(name))
    }

    /// Answer a question about one bank
    pub fn format_response(&self, entry: &BankEntry, message: &str) -> String {
        let topic = BankTopic::detect(message);
        tracing::debug!(bank = %entry.key, ?topic, "Formatting bank answer");

        match topic {
            BankTopic::Contact => format_contacts(entry),
            BankTopic::EmailTemplate => format_email_template(entry),
            BankTopic::Registration => format_list(
                &format!("How to register for {} online banking:", entry.name),
                &entry.registration,
                true,
            )
            .unwrap_or_else(|| format_overview(entry)),
            BankTopic::CommonIssues => format_list(
                &format!("Common issues with {}:", entry.name),
                &entry.common_issues,
                false,
            )
            .unwrap_or_else(|| format_overview(entry)),
            BankTopic::DailyLimit => match &entry.limits.daily {
                Some(daily) => format!("{} Daily limit: {}", entry.name, daily),
                None => format_limits(entry),
            },
            BankTopic::MonthlyLimit => match &entry.limits.monthly {
                Some(monthly) => format!("{} Monthly limit: {}", entry.name, monthly),
                None => format_limits(entry),
            },
            BankTopic::Limits => format_limits(entry),
            BankTopic::Scam => format_list(
                &format!("Scam warning for {} customers:", entry.name),
                &entry.scam_advice,
                false,
            )
            .unwrap_or_else(|| format_overview(entry)),
            BankTopic::Overview => format_overview(entry),
        }
    }
}

/// Word-bounded occurrence for Latin names, plain substring otherwise
fn mentions(haystack: &str, name: &str) -> bool {
    if name.is_empty() {
        return false;
    }
    if !name.is_ascii() {
        return haystack.contains(name);
    }
    haystack.match_indices(name).any(|(pos, _)| {
        let before = haystack[..pos].chars().next_back();
        let after = haystack[pos + name.len()..].chars().next();
        !before.map_or(false, |c| c.is_ascii_alphanumeric())
            && !after.map_or(false, |c| c.is_ascii_alphanumeric())
    })
}

fn format_list(title: &str, items: &[String], numbered: bool) -> Option<String> {
    if items.is_empty() {
        return None;
    }
    let lines: Vec<String> = items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            if numbered {
                format!("{}. {}", i + 1, item)
            } else {
                format!("- {}", item)
            }
        })
        .collect();
    Some(format!("{}\n{}", title, lines.join("\n")))
}

fn format_contacts(entry: &BankEntry) -> String {
    let s = &entry.support;
    let mut lines = vec![format!("{} Customer service:", entry.name)];
    let fields = [
        ("Hotline", &s.hotline),
        ("Overseas", &s.overseas),
        ("Email", &s.email),
        ("Website", &s.website),
        ("Hours", &s.hours),
    ];
    lines.extend(
        fields
            .iter()
            .filter_map(|(label, value)| value.as_ref().map(|v| format!("{}: {}", label, v))),
    );
    if lines.len() == 1 {
        lines.push("No contact details on file.".to_string());
    }
    lines.join("\n")
}

fn format_email_template(entry: &BankEntry) -> String {
    let to = entry
        .support
        .email
        .as_deref()
        .or(entry.support.website.as_deref())
        .unwrap_or("the bank's customer service");
    format!(
        "Here is an email template you can send to {name}:\n\n\
         To: {to}\n\
         Subject: Assistance required with my {name} account\n\n\
         Dear {name} Customer Service,\n\n\
         I would like assistance with my account. \
         [Describe the issue, including dates, amounts and reference numbers.]\n\n\
         Please do not include my password or OTP in any reply.\n\n\
         Regards,\n[Your name]\n[Registered mobile number]",
        name = entry.name,
        to = to,
    )
}

fn format_limits(entry: &BankEntry) -> String {
    let l = &entry.limits;
    let mut lines = vec![format!("{} transfer limits:", entry.name)];
    if let Some(daily) = &l.daily {
        lines.push(format!("Daily limit: {}", daily));
    }
    if let Some(monthly) = &l.monthly {
        lines.push(format!("Monthly limit: {}", monthly));
    }
    if let Some(notes) = &l.transfer_notes {
        lines.push(format!("Transfer notes: {}", notes));
    }
    if lines.len() == 1 {
        lines.push("No limit information on file.".to_string());
    }
    lines.join("\n")
}

fn format_overview(entry: &BankEntry) -> String {
    let mut sections = vec![format_limits(entry), format_contacts(entry)];
    sections.extend(format_list("How to register:", &entry.registration, true));
    sections.extend(format_list("Common issues:", &entry.common_issues, false));
    sections.extend(format_list("Scam warning:", &entry.scam_advice, false));
    sections.join("\n\n")
}
