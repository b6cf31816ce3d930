//! Bearer credential verification.

use async_trait::async_trait;
use common::Address;

/// Outcome of a credential check.
///
/// This is a plain value, not a `Result`: an invalid credential is an
/// expected outcome the saga turns into its own terminal failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialCheck {
    pub valid: bool,
    pub message: Option<String>,
}

impl CredentialCheck {
    /// A passing check.
    pub fn valid() -> Self {
        Self {
            valid: true,
            message: None,
        }
    }

    /// A failing check with a reason.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: Some(message.into()),
        }
    }
}

/// Verifies that a bearer token asserts the identity of the principal a
/// request claims to act for. Sagas call this before any external side
/// effect.
#[async_trait]
pub trait CredentialVerifier: Send + Sync + 'static {
    async fn verify(&self, token: &str, expected_principal: &Address) -> CredentialCheck;
}
