//! Tracing subscriber setup for hosts embedding the assistant

use ops_assistant_config::ObservabilityConfig;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

use crate::AgentError;

/// Install a global subscriber
///
/// `RUST_LOG` wins over the configured level. Fails if a global subscriber
/// is already set.
pub fn init_tracing(config: &ObservabilityConfig) -> Result<(), AgentError> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("ops_assistant={}", config.log_level).into());

    let subscriber = tracing_subscriber::registry().with(env_filter);
    let fmt_layer = if config.log_json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    subscriber
        .with(fmt_layer)
        .try_init()
        .map_err(|e| AgentError::Initialization(e.to_string()))
}
