//! Counters emitted by the assistant
//!
//! The host installs a recorder (Prometheus or otherwise); without one these
//! calls are no-ops.

/// A pipeline stage produced the response
pub fn record_stage(stage: &'static str) {
    ::metrics::counter!("ops_assistant_stage_total", "stage" => stage).increment(1);
}

/// An account flow reached an outcome
pub fn record_account_flow(flow: &'static str, outcome: &'static str) {
    ::metrics::counter!(
        "ops_assistant_account_flow_total",
        "flow" => flow,
        "outcome" => outcome
    )
    .increment(1);
}
