//! Caller identity supplied by the embedding application

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl UserInfo {
    pub fn new(
        username: impl Into<String>,
        display_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            username: Some(username.into()),
            display_name: Some(display_name.into()),
            email: Some(email.into()),
        }
    }

    /// Key used for per-user conversation state
    pub fn state_key(&self) -> Option<&str> {
        self.email
            .as_deref()
            .or(self.username.as_deref())
            .filter(|k| !k.trim().is_empty())
    }

    /// First word of the display name, falling back to the username
    pub fn first_name(&self) -> Option<&str> {
        self.display_name
            .as_deref()
            .or(self.username.as_deref())
            .and_then(|name| name.split_whitespace().next())
    }

    /// Email of a signed-in caller; account changes are keyed on it
    pub fn authenticated_email(&self) -> Option<&str> {
        self.email.as_deref().filter(|e| !e.trim().is_empty())
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated_email().is_some()
    }
}
