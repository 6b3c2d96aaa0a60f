//! Conversation state storage
//!
//! Default `ConversationStore` backend: one process-local map keyed by user.
//! Expiry is lazy. `get_state` deletes and hides entries idle longer than
//! the TTL; `purge_expired` is available for hosts that want a sweep.
//!
//! Overlapping calls for the same user key are not atomic with respect to
//! each other. Each individual operation is.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use ops_assistant_config::ConversationConfig;
use ops_assistant_core::{
    Clock, ConversationState, ConversationStore, FlowStep, StateData, StoreError, SystemClock,
};
use parking_lot::RwLock;

pub struct InMemoryConversationStore {
    states: RwLock<HashMap<String, ConversationState>>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl InMemoryConversationStore {
    pub fn new(ttl_secs: u64) -> Self {
        Self::with_clock(Arc::new(SystemClock), ttl_secs)
    }

    pub fn with_clock(clock: Arc<dyn Clock>, ttl_secs: u64) -> Self {
        Self {
            states: RwLock::new(HashMap::new()),
            clock,
            ttl: Duration::seconds(i64::try_from(ttl_secs).unwrap_or(i64::MAX / 1000)),
        }
    }

    pub fn from_config(config: &ConversationConfig, clock: Arc<dyn Clock>) -> Self {
        Self::with_clock(clock, config.state_ttl_secs)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Unexpired states right now
    pub fn active_count(&self) -> usize {
        let now = self.clock.now();
        self.states
            .read()
            .values()
            .filter(|s| !s.is_expired(now, self.ttl))
            .count()
    }

    /// Drop every expired state, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut states = self.states.write();
        let before = states.len();
        states.retain(|_, s| !s.is_expired(now, self.ttl));
        let removed = before - states.len();
        if removed > 0 {
            tracing::debug!(removed, "Purged expired conversation states");
        }
        removed
    }
}

impl Default for InMemoryConversationStore {
    fn default() -> Self {
        Self::new(ops_assistant_config::constants::conversation::STATE_TTL_SECS)
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn set_state(
        &self,
        user_key: &str,
        step: FlowStep,
        data: StateData,
    ) -> Result<(), StoreError> {
        let state = ConversationState::new(user_key, step, data, self.clock.now());
        tracing::debug!(user_key, step = %step, "Set conversation state");
        self.states.write().insert(user_key.to_string(), state);
        Ok(())
    }

    async fn get_state(&self, user_key: &str) -> Result<Option<ConversationState>, StoreError> {
        let now = self.clock.now();
        {
            let states = self.states.read();
            match states.get(user_key) {
                None => return Ok(None),
                Some(state) if !state.is_expired(now, self.ttl) => return Ok(Some(state.clone())),
                Some(_) => {}
            }
        }

        let mut states = self.states.write();
        // Re-check under the write lock; another call may have refreshed it
        match states.get(user_key) {
            Some(state) if state.is_expired(now, self.ttl) => {
                tracing::debug!(user_key, step = %state.step, "Conversation state expired");
                states.remove(user_key);
                Ok(None)
            }
            other => Ok(other.cloned()),
        }
    }

    async fn update_data(&self, user_key: &str, partial: StateData) -> Result<(), StoreError> {
        let now = self.clock.now();
        let mut states = self.states.write();
        match states.get_mut(user_key) {
            Some(state) if state.is_expired(now, self.ttl) => {
                states.remove(user_key);
            }
            Some(state) => {
                state.data.extend(partial);
                state.touched_at = now;
            }
            None => {}
        }
        Ok(())
    }

    async fn clear_state(&self, user_key: &str) -> Result<(), StoreError> {
        self.states.write().remove(user_key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use ops_assistant_core::ManualClock;
    use serde_json::json;

    fn store() -> (Arc<ManualClock>, InMemoryConversationStore) {
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 15, 9, 0, 0).unwrap()));
        let store = InMemoryConversationStore::with_clock(clock.clone(), 300);
        (clock, store)
    }

    fn data(key: &str, value: serde_json::Value) -> StateData {
        let mut map = StateData::new();
        map.insert(key.to_string(), value);
        map
    }

    #[tokio::test]
    async fn test_set_get_clear() {
        let (_, store) = store();
        store
            .set_state("u1", FlowStep::AwaitingEmail, data("lang", json!("en")))
            .await
            .unwrap();

        let state = store.get_state("u1").await.unwrap().unwrap();
        assert_eq!(state.step, FlowStep::AwaitingEmail);
        assert_eq!(state.get_str("lang"), Some("en"));
        assert!(store.get_state("u2").await.unwrap().is_none());

        store.clear_state("u1").await.unwrap();
        assert!(store.get_state("u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_refreshes_timestamp() {
        let (clock, store) = store();
        store
            .set_state("u1", FlowStep::AwaitingCode, data("attempts", json!(0)))
            .await
            .unwrap();

        clock.advance(Duration::seconds(200));
        store.update_data("u1", data("attempts", json!(1))).await.unwrap();
        clock.advance(Duration::seconds(200));

        let state = store.get_state("u1").await.unwrap().unwrap();
        assert_eq!(state.get_u64("attempts"), Some(1));
    }

    #[tokio::test]
    async fn test_update_without_state_is_noop() {
        let (_, store) = store();
        store.update_data("ghost", data("x", json!(1))).await.unwrap();
        assert!(store.get_state("ghost").await.unwrap().is_none());
        assert_eq!(store.active_count(), 0);
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let (clock, store) = store();
        store.set_state("old", FlowStep::AwaitingName, StateData::new()).await.unwrap();
        clock.advance(Duration::seconds(250));
        store.set_state("new", FlowStep::AwaitingName, StateData::new()).await.unwrap();
        clock.advance(Duration::seconds(100));

        assert_eq!(store.active_count(), 1);
        assert_eq!(store.purge_expired(), 1);
        assert!(store.get_state("new").await.unwrap().is_some());
    }
}
