//! Configuration management for the operations assistant
//!
//! Supports loading configuration from:
//! - YAML/TOML files (`config/default`, `config/{env}`)
//! - Environment variables (OPS_ASSISTANT_ prefix, `__` section separator)
//! - Runtime overrides on the deserialized `Settings`

pub mod constants;
pub mod settings;

pub use settings::{
    load_settings, load_settings_from, ConversationConfig, KnowledgeConfig, ObservabilityConfig,
    QueryConfig, RuntimeEnvironment, SecurityConfig, Settings, TotpConfig,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
