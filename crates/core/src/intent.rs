//! Intent tags
//!
//! A closed set of categories describing what kind of data a message asks
//! for. Produced fresh per message; carries no state.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    BankIssues,
    FollowUp,
    StockMail,
    LastIn,
    LastOut,
    Transactions,
    COperations,
    AgentList,
    WealthList,
    DailyReport,
    BankInfo,
    Unknown,
}

impl Intent {
    /// Every intent that maps onto a record category, in display order
    pub const DATA_INTENTS: [Intent; 10] = [
        Intent::BankIssues,
        Intent::FollowUp,
        Intent::StockMail,
        Intent::LastIn,
        Intent::LastOut,
        Intent::Transactions,
        Intent::COperations,
        Intent::AgentList,
        Intent::WealthList,
        Intent::DailyReport,
    ];

    /// Wire tag, e.g. `STOCK_MAIL`
    pub fn tag(&self) -> &'static str {
        match self {
            Self::BankIssues => "BANK_ISSUES",
            Self::FollowUp => "FOLLOW_UP",
            Self::StockMail => "STOCK_MAIL",
            Self::LastIn => "LAST_IN",
            Self::LastOut => "LAST_OUT",
            Self::Transactions => "TRANSACTIONS",
            Self::COperations => "C_OPERATIONS",
            Self::AgentList => "AGENT_LIST",
            Self::WealthList => "WEALTH_LIST",
            Self::DailyReport => "DAILY_REPORT",
            Self::BankInfo => "BANK_INFO",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Navigation hint for the caller's router
    pub fn page(&self) -> Option<&'static str> {
        match self {
            Self::BankIssues => Some("/bank-issues"),
            Self::FollowUp => Some("/follow-ups"),
            Self::StockMail => Some("/stock-mail"),
            Self::LastIn => Some("/last-in"),
            Self::LastOut => Some("/last-out"),
            Self::Transactions => Some("/transactions"),
            Self::COperations => Some("/c-operations"),
            Self::AgentList => Some("/agents"),
            Self::WealthList => Some("/wealth"),
            Self::DailyReport => Some("/daily-report"),
            Self::BankInfo => Some("/bank-info"),
            Self::Unknown => None,
        }
    }

    /// Human label used in rendered listings
    pub fn label(&self) -> &'static str {
        match self {
            Self::BankIssues => "bank issue",
            Self::FollowUp => "follow-up",
            Self::StockMail => "stock mail",
            Self::LastIn => "last-in record",
            Self::LastOut => "last-out record",
            Self::Transactions => "transaction",
            Self::COperations => "C-operation",
            Self::AgentList => "agent",
            Self::WealthList => "wealth record",
            Self::DailyReport => "daily report",
            Self::BankInfo => "bank",
            Self::Unknown => "item",
        }
    }

    pub fn is_data(&self) -> bool {
        Self::DATA_INTENTS.contains(self)
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_serialize_as_wire_names() {
        let json = serde_json::to_string(&Intent::StockMail).unwrap();
        assert_eq!(json, "\"STOCK_MAIL\"");
        assert_eq!(Intent::COperations.tag(), "C_OPERATIONS");
    }

    #[test]
    fn test_unknown_has_no_page() {
        assert!(Intent::Unknown.page().is_none());
        assert!(!Intent::Unknown.is_data());
        assert!(!Intent::BankInfo.is_data());
        assert!(Intent::DailyReport.is_data());
    }
}
