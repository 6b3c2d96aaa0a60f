//! The dispatcher's single output contract

use serde::{Deserialize, Serialize};

use crate::entity::EntityFilter;

/// Response handed back to the embedding UI
///
/// `page` and `filter` are advisory navigation hints. `qr_code`, when set,
/// is a TOTP provisioning URI for the caller to render, never an image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotResponse {
    pub page: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<EntityFilter>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_data: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requires_refresh: Option<bool>,
}

impl BotResponse {
    /// Plain chat reply with no navigation hint
    pub fn text(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    /// Reply pointing the caller at a page
    pub fn for_page(page: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            page: Some(page.into()),
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn with_filter(mut self, filter: EntityFilter) -> Self {
        if !filter.is_empty() {
            self.filter = Some(filter);
        }
        self
    }

    pub fn with_has_data(mut self, has_data: bool) -> Self {
        self.has_data = Some(has_data);
        self
    }

    pub fn with_qr_code(mut self, uri: impl Into<String>) -> Self {
        self.qr_code = Some(uri.into());
        self
    }

    pub fn with_refresh(mut self) -> Self {
        self.requires_refresh = Some(true);
        self
    }
}
