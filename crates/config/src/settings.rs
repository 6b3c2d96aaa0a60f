//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::constants::{conversation, query, security};
use crate::ConfigError;

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    /// Development mode - relaxed validation, warnings only
    #[default]
    Development,
    /// Staging mode - stricter validation
    Staging,
    /// Production mode - all validations enforced
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Check if strict validation should be applied
    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }
}

/// Main assistant settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    /// Conversation state store
    #[serde(default)]
    pub conversation: ConversationConfig,

    /// Account recovery and profile edit flows
    #[serde(default)]
    pub security: SecurityConfig,

    /// Data query paging
    #[serde(default)]
    pub query: QueryConfig,

    /// Bank knowledge catalogue
    #[serde(default)]
    pub knowledge: KnowledgeConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    /// Seconds of inactivity before a flow state is dropped
    #[serde(default = "default_state_ttl_secs")]
    pub state_ttl_secs: u64,

    /// Key used when the caller supplies no identity
    #[serde(default = "default_user_key")]
    pub default_user_key: String,
}

fn default_state_ttl_secs() -> u64 {
    conversation::STATE_TTL_SECS
}

fn default_user_key() -> String {
    conversation::ANONYMOUS_USER_KEY.to_string()
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            state_ttl_secs: default_state_ttl_secs(),
            default_user_key: default_user_key(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TotpConfig {
    /// Issuer shown in authenticator apps
    #[serde(default = "default_issuer")]
    pub issuer: String,

    #[serde(default = "default_digits")]
    pub digits: u32,

    #[serde(default = "default_period")]
    pub period_secs: u64,

    /// Accepted time steps either side of the current one
    #[serde(default = "default_skew")]
    pub skew: u8,
}

fn default_issuer() -> String {
    security::TOTP_ISSUER.to_string()
}
fn default_digits() -> u32 {
    security::TOTP_DIGITS
}
fn default_period() -> u64 {
    security::TOTP_PERIOD_SECS
}
fn default_skew() -> u8 {
    security::TOTP_SKEW
}

impl Default for TotpConfig {
    fn default() -> Self {
        Self {
            issuer: default_issuer(),
            digits: default_digits(),
            period_secs: default_period(),
            skew: default_skew(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(default)]
    pub totp: TotpConfig,

    /// Wrong codes tolerated before the reset flow is abandoned (0 = unlimited)
    #[serde(default = "default_max_code_attempts")]
    pub max_code_attempts: u32,

    /// Report "email not found" distinctly from other failures
    #[serde(default = "default_true")]
    pub reveal_unknown_email: bool,

    #[serde(default = "default_password_length")]
    pub password_length: usize,
}

fn default_max_code_attempts() -> u32 {
    security::MAX_CODE_ATTEMPTS
}
fn default_password_length() -> usize {
    security::PASSWORD_LENGTH
}
fn default_true() -> bool {
    true
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            totp: TotpConfig::default(),
            max_code_attempts: default_max_code_attempts(),
            reveal_unknown_email: true,
            password_length: default_password_length(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Page size for detail-heavy categories
    #[serde(default = "default_small_page")]
    pub small_page_size: usize,

    /// Page size for compact listings
    #[serde(default = "default_large_page")]
    pub large_page_size: usize,
}

fn default_small_page() -> usize {
    query::SMALL_PAGE_SIZE
}
fn default_large_page() -> usize {
    query::LARGE_PAGE_SIZE
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            small_page_size: default_small_page(),
            large_page_size: default_large_page(),
        }
    }
}

/// Bank knowledge catalogue source
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// YAML catalogue replacing the built-in one
    #[serde(default)]
    pub catalogue_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub log_json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
        }
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_conversation()?;
        self.validate_security()?;
        self.validate_query()?;
        Ok(())
    }

    fn validate_conversation(&self) -> Result<(), ConfigError> {
        if self.conversation.state_ttl_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "conversation.state_ttl_secs".to_string(),
                message: "TTL must be positive".to_string(),
            });
        }
        if self.conversation.default_user_key.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "conversation.default_user_key".to_string(),
                message: "Default user key cannot be blank".to_string(),
            });
        }
        Ok(())
    }

    fn validate_security(&self) -> Result<(), ConfigError> {
        let totp = &self.security.totp;
        if !(6..=8).contains(&totp.digits) {
            return Err(ConfigError::InvalidValue {
                field: "security.totp.digits".to_string(),
                message: format!("Must be between 6 and 8, got {}", totp.digits),
            });
        }
        if totp.period_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "security.totp.period_secs".to_string(),
                message: "Period must be positive".to_string(),
            });
        }
        if totp.issuer.contains(':') {
            return Err(ConfigError::InvalidValue {
                field: "security.totp.issuer".to_string(),
                message: "Issuer cannot contain ':'".to_string(),
            });
        }
        // One of each character class plus at least as many random fill
        if self.security.password_length < 8 {
            return Err(ConfigError::InvalidValue {
                field: "security.password_length".to_string(),
                message: format!("Minimum 8, got {}", self.security.password_length),
            });
        }

        if self.environment.is_strict() && self.security.max_code_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "security.max_code_attempts".to_string(),
                message: "Unlimited code attempts are not allowed outside development".to_string(),
            });
        }
        if self.environment.is_production() && self.security.reveal_unknown_email {
            tracing::warn!("reveal_unknown_email is enabled in production");
        }
        Ok(())
    }

    fn validate_query(&self) -> Result<(), ConfigError> {
        if self.query.small_page_size == 0 || self.query.large_page_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "query".to_string(),
                message: "Page sizes must be positive".to_string(),
            });
        }
        Ok(())
    }
}

/// Load settings from `config/` and the environment
///
/// Priority (highest to lowest):
/// 1. Environment variables (OPS_ASSISTANT_ prefix)
/// 2. config/{env}.yaml (if env specified)
/// 3. config/default.yaml
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    load_settings_from("config", env)
}

/// Load settings from an explicit configuration directory
pub fn load_settings_from<P: AsRef<Path>>(
    dir: P,
    env: Option<&str>,
) -> Result<Settings, ConfigError> {
    let dir = dir.as_ref();
    let mut builder = Config::builder();

    builder = builder
        .add_source(File::with_name(&dir.join("default").to_string_lossy()).required(false));

    if let Some(env_name) = env {
        builder = builder
            .add_source(File::with_name(&dir.join(env_name).to_string_lossy()).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("OPS_ASSISTANT")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}
