//! Account mutation callbacks injected by the caller
//!
//! The assistant owns no credential storage. These three functions are the
//! only mutation points into the caller's authentication store. Every
//! invocation result is data: an `Err` is handled like a declined call.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum CallbackError {
    #[error("Callback not provided: {0}")]
    Missing(&'static str),

    #[error("Callback failed: {0}")]
    Failed(String),
}

#[async_trait]
pub trait AccountCallbacks: Send + Sync {
    /// Whether an account with this email exists
    async fn verify_user_email(&self, email: &str) -> Result<bool, CallbackError>;

    /// Replace the password for the account
    async fn update_user_password(
        &self,
        email: &str,
        new_password: &str,
    ) -> Result<bool, CallbackError>;

    /// Rename the account; `None` leaves that field unchanged
    async fn update_user_profile(
        &self,
        email: &str,
        username: Option<&str>,
        display_name: Option<&str>,
    ) -> Result<bool, CallbackError>;
}
