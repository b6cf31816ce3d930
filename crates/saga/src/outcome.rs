//! Terminal disposition of a saga run.

use serde::{Deserialize, Serialize};

/// The discriminant every saga output carries.
///
/// Callers must branch on this, never on the absence of an error: expected
/// business failures come back as `Failed` with a message, not as `Err`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Disposition {
    Success,
    Failed,
}

impl Disposition {
    /// Returns true for the success disposition.
    pub fn is_success(&self) -> bool {
        matches!(self, Disposition::Success)
    }
}
