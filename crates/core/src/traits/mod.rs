//! Traits for pluggable backends
//!
//! The dispatcher depends only on these interfaces:
//! - `ConversationStore` - per-user flow state with TTL eviction
//! - `AccountCallbacks` - the caller's user-store mutation points
//! - `IntentClassifier` - message to intent mapping
//! - `Clock` - time source, swappable for virtual time in tests

mod account;
mod classifier;
mod clock;
mod store;

pub use account::{AccountCallbacks, CallbackError};
pub use classifier::IntentClassifier;
pub use clock::{Clock, ManualClock, SystemClock};
pub use store::{ConversationStore, StoreError};
