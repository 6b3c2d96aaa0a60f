//! Injected datasets
//!
//! Records are loosely typed JSON objects; no schema validation is applied.
//! Absent or malformed fields render as "N/A" or are skipped downstream.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::intent::Intent;

pub type Record = Value;

/// The ten record arrays the assistant can query
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DataSources {
    pub bank_issues: Vec<Record>,
    pub follow_ups: Vec<Record>,
    pub stock_mail: Vec<Record>,
    pub last_in: Vec<Record>,
    pub last_out: Vec<Record>,
    pub transactions: Vec<Record>,
    pub c_operations: Vec<Record>,
    pub agents: Vec<Record>,
    pub wealth: Vec<Record>,
    pub daily_reports: Vec<Record>,
}

impl DataSources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records backing a data intent; empty for non-data intents
    pub fn records_for(&self, intent: Intent) -> &[Record] {
        match intent {
            Intent::BankIssues => &self.bank_issues,
            Intent::FollowUp => &self.follow_ups,
            Intent::StockMail => &self.stock_mail,
            Intent::LastIn => &self.last_in,
            Intent::LastOut => &self.last_out,
            Intent::Transactions => &self.transactions,
            Intent::COperations => &self.c_operations,
            Intent::AgentList => &self.agents,
            Intent::WealthList => &self.wealth,
            Intent::DailyReport => &self.daily_reports,
            Intent::BankInfo | Intent::Unknown => &[],
        }
    }

    pub fn total_records(&self) -> usize {
        Intent::DATA_INTENTS
            .iter()
            .map(|intent| self.records_for(*intent).len())
            .sum()
    }
}
