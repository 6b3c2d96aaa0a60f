//! Shared fixtures for agent integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use ops_assistant_agent::{Assistant, InMemoryConversationStore};
use ops_assistant_config::Settings;
use ops_assistant_core::{
    AccountCallbacks, CallbackError, ConversationState, ConversationStore, FlowStep, ManualClock,
    StateData, StoreError,
};
use parking_lot::Mutex;

/// Records every callback invocation
#[derive(Default)]
pub struct MockAccounts {
    pub known_emails: Vec<String>,
    pub fail_updates: bool,
    pub verify_calls: AtomicUsize,
    pub password_updates: AtomicUsize,
    pub last_password: Mutex<Option<String>>,
    pub profile_updates: Mutex<Vec<(String, Option<String>, Option<String>)>>,
}

impl MockAccounts {
    pub fn with_email(email: &str) -> Self {
        Self {
            known_emails: vec![email.to_string()],
            ..Default::default()
        }
    }

    pub fn password_update_count(&self) -> usize {
        self.password_updates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AccountCallbacks for MockAccounts {
    async fn verify_user_email(&self, email: &str) -> Result<bool, CallbackError> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.known_emails.iter().any(|e| e == email))
    }

    async fn update_user_password(
        &self,
        _email: &str,
        new_password: &str,
    ) -> Result<bool, CallbackError> {
        self.password_updates.fetch_add(1, Ordering::SeqCst);
        if self.fail_updates {
            return Err(CallbackError::Failed("user store offline".into()));
        }
        *self.last_password.lock() = Some(new_password.to_string());
        Ok(true)
    }

    async fn update_user_profile(
        &self,
        email: &str,
        username: Option<&str>,
        display_name: Option<&str>,
    ) -> Result<bool, CallbackError> {
        if self.fail_updates {
            return Err(CallbackError::Failed("user store offline".into()));
        }
        self.profile_updates.lock().push((
            email.to_string(),
            username.map(str::to_string),
            display_name.map(str::to_string),
        ));
        Ok(true)
    }
}

/// Store whose backend is always down
pub struct UnavailableStore;

#[async_trait]
impl ConversationStore for UnavailableStore {
    async fn set_state(&self, _: &str, _: FlowStep, _: StateData) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn get_state(&self, _: &str) -> Result<Option<ConversationState>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn update_data(&self, _: &str, _: StateData) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn clear_state(&self, _: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    fn is_distributed(&self) -> bool {
        true
    }
}

pub fn manual_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 15, 9, 30, 0).unwrap()))
}

/// Assistant whose store and TOTP checks share one manual clock
pub fn assistant_with_clock(
    clock: Arc<ManualClock>,
) -> (Assistant, Arc<InMemoryConversationStore>) {
    let settings = Settings::default();
    let store = Arc::new(InMemoryConversationStore::with_clock(
        clock.clone(),
        settings.conversation.state_ttl_secs,
    ));
    let assistant = Assistant::new(&settings)
        .unwrap()
        .with_store(store.clone())
        .with_clock(clock);
    (assistant, store)
}

/// `secret` query parameter of an otpauth URI
pub fn secret_from_uri(uri: &str) -> String {
    let url = url::Url::parse(uri).unwrap();
    url.query_pairs()
        .find(|(k, _)| k == "secret")
        .map(|(_, v)| v.into_owned())
        .unwrap()
}
