//! Intent Classification
//!
//! Maps a message to one intent by scanning an ordered rule table and
//! returning the first intent whose keyword set matches. No scoring and no
//! ties: table order is the precedence. Specific intents are listed before
//! the broad `BankInfo` catch-all, which would otherwise shadow them.
//!
//! # Example
//!
//! ```
//! use ops_assistant_core::{Intent, IntentClassifier};
//! use ops_assistant_text_processing::intent::KeywordIntentClassifier;
//!
//! let classifier = KeywordIntentClassifier::new();
//! assert_eq!(classifier.classify("stock mail for DBS"), Intent::StockMail);
//! assert_eq!(classifier.classify("DBS transfer limit"), Intent::BankInfo);
//! ```

use ops_assistant_core::{Intent, IntentClassifier};
use serde::{Deserialize, Serialize};

use crate::matching::Normalized;

/// One row of the classification table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentRule {
    pub intent: Intent,
    /// Latin keywords match case-insensitively, others exactly
    pub keywords: Vec<String>,
}

impl IntentRule {
    pub fn new(intent: Intent, keywords: &[&str]) -> Self {
        Self {
            intent,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    fn matches(&self, text: &Normalized<'_>) -> bool {
        self.keywords.iter().any(|k| text.contains(k))
    }
}

/// First-match keyword classifier
pub struct KeywordIntentClassifier {
    rules: Vec<IntentRule>,
}

impl KeywordIntentClassifier {
    /// Classifier with the built-in bilingual table
    pub fn new() -> Self {
        Self {
            rules: default_rules(),
        }
    }

    /// Classifier with a custom table; order is preserved as given
    pub fn with_rules(rules: Vec<IntentRule>) -> Self {
        Self { rules }
    }

    /// The table in precedence order
    pub fn rules(&self) -> &[IntentRule] {
        &self.rules
    }

    /// Position of an intent in the table, if present
    pub fn precedence_of(&self, intent: Intent) -> Option<usize> {
        self.rules.iter().position(|r| r.intent == intent)
    }
}

impl Default for KeywordIntentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentClassifier for KeywordIntentClassifier {
    fn classify(&self, text: &str) -> Intent {
        let normalized = Normalized::new(text);
        let intent = self
            .rules
            .iter()
            .find(|rule| rule.matches(&normalized))
            .map(|rule| rule.intent)
            .unwrap_or(Intent::Unknown);
        tracing::debug!(intent = %intent, "Classified message");
        intent
    }

    fn name(&self) -> &str {
        "keyword"
    }
}

fn default_rules() -> Vec<IntentRule> {
    vec![
        IntentRule::new(
            Intent::StockMail,
            &[
                "stock mail",
                "stock email",
                "stock-mail",
                "mail stock",
                "stock letter",
                "库存邮件",
                "股票邮件",
            ],
        ),
        IntentRule::new(
            Intent::BankIssues,
            &[
                "bank issue",
                "issue list",
                "issues list",
                "reported issue",
                "all issues",
                "show issues",
                "list issues",
                "pending issue",
                "银行问题",
                "问题列表",
            ],
        ),
        IntentRule::new(Intent::FollowUp, &["follow up", "follow-up", "followup", "跟进"]),
        IntentRule::new(
            Intent::LastIn,
            &["last in", "last-in", "check in", "check-in", "clock in", "签到"],
        ),
        IntentRule::new(
            Intent::LastOut,
            &["last out", "last-out", "check out", "check-out", "clock out", "签退"],
        ),
        IntentRule::new(Intent::Transactions, &["transaction", "payment record", "交易记录", "交易"]),
        IntentRule::new(
            Intent::COperations,
            &["c-operation", "c-op", "c operation", "coperation", "c操作"],
        ),
        IntentRule::new(
            Intent::AgentList,
            &["agent list", "list agents", "show agents", "all agents", "agents", "代理列表", "坐席"],
        ),
        IntentRule::new(Intent::WealthList, &["wealth", "财富", "理财"]),
        IntentRule::new(
            Intent::DailyReport,
            &["daily report", "daily summary", "report for", "日报", "每日报告"],
        ),
        IntentRule::new(
            Intent::BankInfo,
            &[
                "bank",
                "limit",
                "hotline",
                "customer service",
                "contact",
                "register",
                "registration",
                "scam",
                "fraud",
                "dbs",
                "posb",
                "ocbc",
                "uob",
                "maybank",
                "cimb",
                "hsbc",
                "standard chartered",
                "citibank",
                "public bank",
                "rhb",
                "银行",
                "限额",
                "客服",
            ],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_mail_beats_bank_info() {
        let classifier = KeywordIntentClassifier::new();
        assert_eq!(classifier.classify("show stock mail about the bank"), Intent::StockMail);
        assert_eq!(classifier.classify("DBS stock mail today"), Intent::StockMail);
    }

    #[test]
    fn test_bank_info_is_last() {
        let classifier = KeywordIntentClassifier::new();
        let last = classifier.rules().last().unwrap();
        assert_eq!(last.intent, Intent::BankInfo);

        let stock = classifier.precedence_of(Intent::StockMail).unwrap();
        let bank_info = classifier.precedence_of(Intent::BankInfo).unwrap();
        assert!(stock < bank_info);
    }

    #[test]
    fn test_bank_issue_contains_bank_but_wins() {
        let classifier = KeywordIntentClassifier::new();
        assert_eq!(classifier.classify("list bank issues for Alice"), Intent::BankIssues);
    }

    #[test]
    fn test_chinese_keywords() {
        let classifier = KeywordIntentClassifier::new();
        assert_eq!(classifier.classify("显示跟进记录"), Intent::FollowUp);
        assert_eq!(classifier.classify("星展银行的限额"), Intent::BankInfo);
    }

    #[test]
    fn test_each_data_category() {
        let classifier = KeywordIntentClassifier::new();
        let cases = [
            ("who did the last check-in", Intent::LastIn),
            ("last out records", Intent::LastOut),
            ("transactions on 3/1/2024", Intent::Transactions),
            ("pending c-operations", Intent::COperations),
            ("show agents", Intent::AgentList),
            ("wealth for Ben", Intent::WealthList),
            ("daily report for today", Intent::DailyReport),
        ];
        for (text, expected) in cases {
            assert_eq!(classifier.classify(text), expected, "{}", text);
        }
    }

    #[test]
    fn test_unknown() {
        let classifier = KeywordIntentClassifier::new();
        assert_eq!(classifier.classify("what's the weather like"), Intent::Unknown);
    }

    #[test]
    fn test_custom_table_order_is_respected() {
        let classifier = KeywordIntentClassifier::with_rules(vec![
            IntentRule::new(Intent::BankInfo, &["bank"]),
            IntentRule::new(Intent::StockMail, &["stock mail"]),
        ]);
        assert_eq!(classifier.classify("bank stock mail"), Intent::BankInfo);
    }
}
