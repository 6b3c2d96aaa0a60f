//! Core traits and types for the operations assistant
//!
//! This crate provides foundational types used across all other crates:
//! - The response contract returned to the embedding UI (`BotResponse`)
//! - Intents, entity filters and caller identity
//! - Conversation state records for multi-step flows
//! - Traits for pluggable backends (state store, account callbacks,
//!   intent classifier, clock)

pub mod conversation;
pub mod data;
pub mod entity;
pub mod intent;
pub mod language;
pub mod response;
pub mod traits;
pub mod user;

pub use conversation::{ConversationState, FlowStep, StateData};
pub use data::{DataSources, Record};
pub use entity::EntityFilter;
pub use intent::Intent;
pub use language::Language;
pub use response::BotResponse;
pub use user::UserInfo;

pub use traits::{
    AccountCallbacks, CallbackError, Clock, ConversationStore, IntentClassifier, ManualClock,
    StoreError, SystemClock,
};
