//! Account management flows
//!
//! Two multi-step dialogues keyed by user:
//!
//! - **Password reset**: `AwaitingEmail -> AwaitingCode -> cleared`. The email
//!   is checked through the caller's callback, a fresh TOTP secret is issued
//!   as an `otpauth://` URI, and a valid code triggers a generated password.
//! - **Profile edit**: `AwaitingName -> cleared`, or a single step when a
//!   signed-in caller's trigger already carries the new name.
//!
//! Callback failures are handled like declined calls: the flow is abandoned
//! with a generic message and never surfaces an error to the caller. The
//! language of the triggering message is kept in the state data so the
//! whole flow answers in one language.

mod names;
mod replies;

use std::sync::Arc;

use ops_assistant_config::SecurityConfig;
use ops_assistant_core::{
    AccountCallbacks, BotResponse, CallbackError, Clock, ConversationState, ConversationStore,
    FlowStep, Language, StateData, UserInfo,
};
use ops_assistant_text_processing::matching::Normalized;
use ops_assistant_text_processing::{EntityExtractor, ScriptDetector};
use serde_json::Value;

use crate::metrics::record_account_flow;
use crate::password::generate_password;
use crate::totp::Totp;

pub use names::{extract_explicit, extract_reply, NameChange};
pub use replies::Reply;

const RESET_TRIGGERS: &[&str] = &[
    "forgot password",
    "forgot my password",
    "forgotten my password",
    "forget password",
    "reset password",
    "reset my password",
    "cannot login",
    "cannot log in",
    "can't login",
    "can't log in",
    "cant login",
    "unable to login",
    "unable to log in",
    "locked out",
    "忘记密码",
    "忘了密码",
    "重置密码",
    "无法登录",
    "登录不了",
];

const PROFILE_TRIGGERS: &[&str] = &[
    "change my name",
    "change my username",
    "change my display name",
    "update my name",
    "update my username",
    "update my display name",
    "change username",
    "change display name",
    "update display name",
    "edit my profile",
    "edit profile",
    "修改名字",
    "修改用户名",
    "更改名字",
    "改名字",
    "修改显示名",
];

const KEY_LANG: &str = "lang";
const KEY_EMAIL: &str = "email";
const KEY_SECRET: &str = "secret";
const KEY_URI: &str = "uri";
const KEY_ATTEMPTS: &str = "attempts";

/// Flow a message asks to start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountAction {
    PasswordReset,
    ProfileEdit,
}

impl AccountAction {
    pub fn detect(message: &str) -> Option<Self> {
        let text = Normalized::new(message);
        if text.contains_any(RESET_TRIGGERS) {
            Some(Self::PasswordReset)
        } else if text.contains_any(PROFILE_TRIGGERS) {
            Some(Self::ProfileEdit)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PasswordReset => "password_reset",
            Self::ProfileEdit => "profile_edit",
        }
    }
}

pub struct AccountFlowEngine {
    store: Arc<dyn ConversationStore>,
    clock: Arc<dyn Clock>,
    totp: Totp,
    extractor: EntityExtractor,
    detector: ScriptDetector,
    max_code_attempts: u32,
    reveal_unknown_email: bool,
    password_length: usize,
}

impl AccountFlowEngine {
    pub fn new(
        config: &SecurityConfig,
        store: Arc<dyn ConversationStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            clock,
            totp: Totp::new(&config.totp),
            extractor: EntityExtractor::new(),
            detector: ScriptDetector::new(),
            max_code_attempts: config.max_code_attempts,
            reveal_unknown_email: config.reveal_unknown_email,
            password_length: config.password_length,
        }
    }

    /// Live state for the user; store failures read as "no flow"
    pub async fn active_state(&self, user_key: &str) -> Option<ConversationState> {
        match self.store.get_state(user_key).await {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(user_key, error = %e, "Failed to read conversation state");
                None
            }
        }
    }

    /// Begin a flow, replacing any flow already in progress
    pub async fn start(
        &self,
        action: AccountAction,
        user_key: &str,
        message: &str,
        user: Option<&UserInfo>,
        callbacks: Option<&dyn AccountCallbacks>,
    ) -> BotResponse {
        let lang = self.detector.detect(message);
        tracing::info!(user_key, flow = action.as_str(), "Starting account flow");
        record_account_flow(action.as_str(), "started");

        match action {
            AccountAction::PasswordReset => {
                self.start_reset(user_key, message, lang, callbacks).await
            }
            AccountAction::ProfileEdit => {
                self.start_profile(user_key, message, lang, user, callbacks).await
            }
        }
    }

    /// Handle a message while a flow is active
    ///
    /// A fresh trigger restarts its flow; anything else is input for the
    /// current step.
    pub async fn continue_flow(
        &self,
        state: ConversationState,
        message: &str,
        user: Option<&UserInfo>,
        callbacks: Option<&dyn AccountCallbacks>,
    ) -> BotResponse {
        if let Some(action) = AccountAction::detect(message) {
            return self.start(action, &state.user_key, message, user, callbacks).await;
        }

        let lang = state
            .get_str(KEY_LANG)
            .and_then(Language::from_code)
            .unwrap_or_default();
        tracing::debug!(user_key = %state.user_key, step = %state.step, "Continuing account flow");

        match state.step {
            FlowStep::AwaitingEmail => {
                self.handle_email(&state.user_key, message, lang, callbacks).await
            }
            FlowStep::AwaitingCode => self.handle_code(&state, message, lang, callbacks).await,
            FlowStep::AwaitingName => {
                self.handle_name(&state.user_key, message, lang, user, callbacks).await
            }
        }
    }

    async fn start_reset(
        &self,
        user_key: &str,
        message: &str,
        lang: Language,
        callbacks: Option<&dyn AccountCallbacks>,
    ) -> BotResponse {
        if self.extractor.extract_email(message).is_some() {
            return self.handle_email(user_key, message, lang, callbacks).await;
        }

        let mut data = StateData::new();
        data.insert(KEY_LANG.into(), Value::from(lang.code()));
        if let Err(e) = self.store.set_state(user_key, FlowStep::AwaitingEmail, data).await {
            tracing::warn!(user_key, error = %e, "Failed to store conversation state");
            return reply(Reply::ResetFailed, lang);
        }
        reply(Reply::AskEmail, lang)
    }

    async fn handle_email(
        &self,
        user_key: &str,
        message: &str,
        lang: Language,
        callbacks: Option<&dyn AccountCallbacks>,
    ) -> BotResponse {
        let Some(email) = self.extractor.extract_email(message) else {
            return reply(Reply::EmailReprompt, lang);
        };

        let callbacks = match require(callbacks, "verify_user_email") {
            Ok(callbacks) => callbacks,
            Err(e) => {
                tracing::warn!(user_key, error = %e, "Password reset cannot continue");
                return self
                    .abort(user_key, "password_reset", "callback_missing", Reply::ResetFailed, lang)
                    .await;
            }
        };

        match callbacks.verify_user_email(&email).await {
            Ok(true) => {}
            Ok(false) => {
                let reply = if self.reveal_unknown_email {
                    Reply::EmailNotFound
                } else {
                    Reply::EmailNotVerified
                };
                return self.abort(user_key, "password_reset", "unknown_email", reply, lang).await;
            }
            Err(e) => {
                tracing::warn!(user_key, error = %e, "Email verification callback failed");
                return self
                    .abort(user_key, "password_reset", "callback_error", Reply::ResetFailed, lang)
                    .await;
            }
        }

        let secret = self.totp.generate_secret();
        let uri = match self.totp.provisioning_uri(&secret, &email) {
            Ok(uri) => uri,
            Err(e) => {
                tracing::error!(error = %e, "Failed to build provisioning URI");
                return self
                    .abort(user_key, "password_reset", "error", Reply::ResetFailed, lang)
                    .await;
            }
        };

        let mut data = StateData::new();
        data.insert(KEY_LANG.into(), Value::from(lang.code()));
        data.insert(KEY_EMAIL.into(), Value::from(email));
        data.insert(KEY_SECRET.into(), Value::from(secret));
        data.insert(KEY_URI.into(), Value::from(uri.clone()));
        data.insert(KEY_ATTEMPTS.into(), Value::from(0u64));

        if let Err(e) = self.store.set_state(user_key, FlowStep::AwaitingCode, data).await {
            tracing::warn!(user_key, error = %e, "Failed to store conversation state");
            return self
                .abort(user_key, "password_reset", "store_error", Reply::ResetFailed, lang)
                .await;
        }

        record_account_flow("password_reset", "challenge_issued");
        reply(Reply::ScanCode, lang).with_qr_code(uri)
    }

    async fn handle_code(
        &self,
        state: &ConversationState,
        message: &str,
        lang: Language,
        callbacks: Option<&dyn AccountCallbacks>,
    ) -> BotResponse {
        let user_key = state.user_key.as_str();
        let Some(code) = self.extractor.extract_code(message) else {
            return reply(Reply::CodeReprompt, lang);
        };

        let (Some(email), Some(secret)) = (state.get_str(KEY_EMAIL), state.get_str(KEY_SECRET))
        else {
            tracing::warn!(user_key, "Code step without email or secret in state");
            return self.abort(user_key, "password_reset", "error", Reply::ResetFailed, lang).await;
        };

        match self.totp.verify(secret, &code, self.clock.now()) {
            Ok(true) => {}
            Ok(false) => return self.reject_code(state, lang).await,
            Err(e) => {
                tracing::warn!(user_key, error = %e, "Stored TOTP secret is unusable");
                return self
                    .abort(user_key, "password_reset", "error", Reply::ResetFailed, lang)
                    .await;
            }
        }

        let callbacks = match require(callbacks, "update_user_password") {
            Ok(callbacks) => callbacks,
            Err(e) => {
                tracing::warn!(user_key, error = %e, "Password reset cannot complete");
                return self
                    .abort(user_key, "password_reset", "callback_missing", Reply::ResetFailed, lang)
                    .await;
            }
        };

        let password = generate_password(self.password_length, &mut rand::thread_rng());
        let outcome = callbacks.update_user_password(email, &password).await;
        self.clear(user_key).await;

        match outcome {
            Ok(true) => {
                tracing::info!(user_key, "Password reset completed");
                record_account_flow("password_reset", "completed");
                reply(Reply::PasswordReset { password }, lang)
            }
            Ok(false) => {
                record_account_flow("password_reset", "update_declined");
                reply(Reply::ResetFailed, lang)
            }
            Err(e) => {
                tracing::warn!(user_key, error = %e, "Password update callback failed");
                record_account_flow("password_reset", "callback_error");
                reply(Reply::ResetFailed, lang)
            }
        }
    }

    async fn reject_code(&self, state: &ConversationState, lang: Language) -> BotResponse {
        let user_key = state.user_key.as_str();
        let attempts = state.get_u64(KEY_ATTEMPTS).unwrap_or(0) + 1;
        let limit = u64::from(self.max_code_attempts);

        if limit > 0 && attempts >= limit {
            tracing::info!(user_key, attempts, "Too many incorrect codes");
            return self
                .abort(
                    user_key,
                    "password_reset",
                    "too_many_attempts",
                    Reply::TooManyAttempts,
                    lang,
                )
                .await;
        }

        let mut partial = StateData::new();
        partial.insert(KEY_ATTEMPTS.into(), Value::from(attempts));
        if let Err(e) = self.store.update_data(user_key, partial).await {
            tracing::warn!(user_key, error = %e, "Failed to record code attempt");
        }

        tracing::debug!(user_key, attempts, "Incorrect code");
        let remaining = (limit > 0).then(|| u32::try_from(limit - attempts).unwrap_or(u32::MAX));
        reply(Reply::CodeRejected { remaining }, lang)
    }

    async fn start_profile(
        &self,
        user_key: &str,
        message: &str,
        lang: Language,
        user: Option<&UserInfo>,
        callbacks: Option<&dyn AccountCallbacks>,
    ) -> BotResponse {
        if user.map_or(false, UserInfo::is_authenticated) {
            if let Some(change) = extract_explicit(message) {
                return self.apply_profile(user_key, change, lang, user, callbacks).await;
            }
        }

        let mut data = StateData::new();
        data.insert(KEY_LANG.into(), Value::from(lang.code()));
        if let Err(e) = self.store.set_state(user_key, FlowStep::AwaitingName, data).await {
            tracing::warn!(user_key, error = %e, "Failed to store conversation state");
            return reply(Reply::ProfileFailed, lang);
        }
        reply(Reply::AskName, lang)
    }

    async fn handle_name(
        &self,
        user_key: &str,
        message: &str,
        lang: Language,
        user: Option<&UserInfo>,
        callbacks: Option<&dyn AccountCallbacks>,
    ) -> BotResponse {
        match extract_reply(message) {
            Some(change) => self.apply_profile(user_key, change, lang, user, callbacks).await,
            None => reply(Reply::NameReprompt, lang),
        }
    }

    async fn apply_profile(
        &self,
        user_key: &str,
        change: NameChange,
        lang: Language,
        user: Option<&UserInfo>,
        callbacks: Option<&dyn AccountCallbacks>,
    ) -> BotResponse {
        let Some(email) = user.and_then(UserInfo::authenticated_email) else {
            return self
                .abort(user_key, "profile_edit", "unauthenticated", Reply::SignInRequired, lang)
                .await;
        };
        let callbacks = match require(callbacks, "update_user_profile") {
            Ok(callbacks) => callbacks,
            Err(e) => {
                tracing::warn!(user_key, error = %e, "Profile edit cannot complete");
                return self
                    .abort(user_key, "profile_edit", "callback_missing", Reply::ProfileFailed, lang)
                    .await;
            }
        };

        let outcome = callbacks
            .update_user_profile(email, change.username.as_deref(), change.display_name.as_deref())
            .await;
        self.clear(user_key).await;

        match outcome {
            Ok(true) => {
                tracing::info!(user_key, "Profile updated");
                record_account_flow("profile_edit", "completed");
                reply(
                    Reply::NameUpdated {
                        username: change.username,
                        display_name: change.display_name,
                    },
                    lang,
                )
                .with_refresh()
            }
            Ok(false) => {
                record_account_flow("profile_edit", "update_declined");
                reply(Reply::ProfileFailed, lang)
            }
            Err(e) => {
                tracing::warn!(user_key, error = %e, "Profile update callback failed");
                record_account_flow("profile_edit", "callback_error");
                reply(Reply::ProfileFailed, lang)
            }
        }
    }

    /// Clear state, count the outcome and answer
    async fn abort(
        &self,
        user_key: &str,
        flow: &'static str,
        outcome: &'static str,
        message: Reply,
        lang: Language,
    ) -> BotResponse {
        self.clear(user_key).await;
        record_account_flow(flow, outcome);
        reply(message, lang)
    }

    async fn clear(&self, user_key: &str) {
        if let Err(e) = self.store.clear_state(user_key).await {
            tracing::warn!(user_key, error = %e, "Failed to clear conversation state");
        }
    }
}

fn reply(reply: Reply, lang: Language) -> BotResponse {
    BotResponse::text(reply.render(lang))
}

fn require<'a>(
    callbacks: Option<&'a dyn AccountCallbacks>,
    name: &'static str,
) -> Result<&'a dyn AccountCallbacks, CallbackError> {
    callbacks.ok_or(CallbackError::Missing(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_detection() {
        let reset = Some(AccountAction::PasswordReset);
        let profile = Some(AccountAction::ProfileEdit);
        assert_eq!(AccountAction::detect("I forgot my password"), reset);
        assert_eq!(AccountAction::detect("I CAN'T LOG IN"), reset);
        assert_eq!(AccountAction::detect("我忘记密码了"), reset);
        assert_eq!(AccountAction::detect("please change my name"), profile);
        assert_eq!(AccountAction::detect("我想修改名字"), profile);
        assert_eq!(AccountAction::detect("what password does device 3 use"), None);
    }

    #[test]
    fn test_missing_callbacks_name_the_callback() {
        let err = require(None, "update_user_profile").err().unwrap();
        assert_eq!(err.to_string(), "Callback not provided: update_user_profile");
    }
}
