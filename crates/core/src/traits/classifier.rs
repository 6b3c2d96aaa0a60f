//! Intent classifier seam

use crate::intent::Intent;

/// Maps free text to a single intent
///
/// The default implementation is a first-match keyword table; the dispatcher
/// only sees this trait so a better matcher can be swapped in.
pub trait IntentClassifier: Send + Sync {
    fn classify(&self, text: &str) -> Intent;

    /// Implementation name for logging
    fn name(&self) -> &str {
        "classifier"
    }
}
