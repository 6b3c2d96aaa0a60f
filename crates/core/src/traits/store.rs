//! Conversation state store abstraction
//!
//! Backed by an in-memory map for a single process; a shared store can
//! implement the same trait for multi-instance deployments.

use async_trait::async_trait;
use thiserror::Error;

use crate::conversation::{ConversationState, FlowStep, StateData};

#[derive(Error, Debug, Clone)]
pub enum StoreError {
    #[error("Store backend unavailable: {0}")]
    Unavailable(String),
}

/// Per-user flow state with lazy TTL eviction
///
/// Implementations must treat `get_state` as the expiry point: an expired
/// entry is deleted and reported as absent.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Overwrite any existing state for the user
    async fn set_state(
        &self,
        user_key: &str,
        step: FlowStep,
        data: StateData,
    ) -> Result<(), StoreError>;

    /// Live state, or `None` if absent or expired
    async fn get_state(&self, user_key: &str) -> Result<Option<ConversationState>, StoreError>;

    /// Merge into the existing data and refresh the timestamp; no-op without state
    async fn update_data(&self, user_key: &str, partial: StateData) -> Result<(), StoreError>;

    async fn clear_state(&self, user_key: &str) -> Result<(), StoreError>;

    /// Check if this store is shared across instances
    fn is_distributed(&self) -> bool {
        false
    }
}
