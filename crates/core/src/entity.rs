//! Entity filter extracted from free text

use serde::{Deserialize, Serialize};

/// Structured values pulled out of a message
///
/// Every field is extracted independently; no cross-field validation is
/// performed, so a date fragment may also show up as an amount.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl EntityFilter {
    pub fn is_empty(&self) -> bool {
        self.date.is_none()
            && self.amount.is_none()
            && self.id.is_none()
            && self.agent.is_none()
            && self.email.is_none()
            && self.field.is_none()
            && self.status.is_none()
    }

    /// Merge with another filter, preferring non-None values from other
    pub fn merge(&mut self, other: &EntityFilter) {
        if other.date.is_some() {
            self.date = other.date.clone();
        }
        if other.amount.is_some() {
            self.amount = other.amount.clone();
        }
        if other.id.is_some() {
            self.id = other.id.clone();
        }
        if other.agent.is_some() {
            self.agent = other.agent.clone();
        }
        if other.email.is_some() {
            self.email = other.email.clone();
        }
        if other.field.is_some() {
            self.field = other.field.clone();
        }
        if other.status.is_some() {
            self.status = other.status.clone();
        }
    }
}
