//! Conversation state for multi-step flows

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form per-flow data (email, secret, attempts, ...)
pub type StateData = Map<String, Value>;

/// Step of an in-progress multi-step flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowStep {
    /// Password reset: waiting for the account email
    AwaitingEmail,
    /// Password reset: waiting for the authenticator code
    #[serde(rename = "awaiting_2fa_code")]
    AwaitingCode,
    /// Profile edit: waiting for the new name
    AwaitingName,
}

impl FlowStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AwaitingEmail => "awaiting_email",
            Self::AwaitingCode => "awaiting_2fa_code",
            Self::AwaitingName => "awaiting_name",
        }
    }
}

impl std::fmt::Display for FlowStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One active flow for one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    pub user_key: String,
    pub step: FlowStep,
    pub data: StateData,
    /// Creation time, refreshed on every data update
    pub touched_at: DateTime<Utc>,
}

impl ConversationState {
    pub fn new(
        user_key: impl Into<String>,
        step: FlowStep,
        data: StateData,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            user_key: user_key.into(),
            step,
            data,
            touched_at: now,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>, ttl: chrono::Duration) -> bool {
        now - self.touched_at > ttl
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.data.get(key).and_then(Value::as_u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_step_wire_names() {
        assert_eq!(
            serde_json::to_string(&FlowStep::AwaitingCode).unwrap(),
            "\"awaiting_2fa_code\""
        );
        assert_eq!(FlowStep::AwaitingEmail.as_str(), "awaiting_email");
    }

    #[test]
    fn test_expiry_is_strictly_greater_than_ttl() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let state = ConversationState::new("u", FlowStep::AwaitingName, StateData::new(), t0);
        let ttl = Duration::minutes(5);
        assert!(!state.is_expired(t0 + ttl, ttl));
        assert!(state.is_expired(t0 + ttl + Duration::seconds(1), ttl));
    }
}
