//! Centralized default values

/// Conversation state defaults
pub mod conversation {
    /// Inactivity window after which a flow is forgotten
    pub const STATE_TTL_SECS: u64 = 300;
    /// Key used when the caller supplies no identity
    pub const ANONYMOUS_USER_KEY: &str = "anonymous";
}

/// Account security defaults
pub mod security {
    pub const TOTP_ISSUER: &str = "OpsAssistant";
    pub const TOTP_DIGITS: u32 = 6;
    pub const TOTP_PERIOD_SECS: u64 = 30;
    /// Accepted time steps either side of the current one
    pub const TOTP_SKEW: u8 = 1;
    /// Secret length in bytes (160 bits, RFC 4226 recommendation)
    pub const TOTP_SECRET_BYTES: usize = 20;
    pub const MAX_CODE_ATTEMPTS: u32 = 5;
    pub const PASSWORD_LENGTH: usize = 12;
}

/// Data query defaults
pub mod query {
    pub const SMALL_PAGE_SIZE: usize = 10;
    pub const LARGE_PAGE_SIZE: usize = 20;
}
