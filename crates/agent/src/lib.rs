//! Conversation orchestration for the operations assistant
//!
//! - `Assistant`: the message dispatcher and its ordered stage pipeline
//! - Account flows (password reset with a TOTP challenge, profile edit)
//! - In-memory conversation state with lazy expiry
//! - Tracing setup and counters

pub mod account;
pub mod dispatcher;
pub mod metrics;
pub mod password;
pub mod state;
pub mod telemetry;
pub mod totp;

pub use account::{AccountAction, AccountFlowEngine, NameChange, Reply};
pub use dispatcher::{Assistant, Stage};
pub use password::generate_password;
pub use state::InMemoryConversationStore;
pub use telemetry::init_tracing;
pub use totp::{Totp, TotpError};

use ops_assistant_config::ConfigError;
use ops_assistant_tools::KnowledgeError;
use thiserror::Error;

/// Errors raised while building an assistant
///
/// Answering a message never fails; these only come from setup.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Knowledge base error: {0}")]
    Knowledge(#[from] KnowledgeError),

    #[error("Initialization error: {0}")]
    Initialization(String),
}
