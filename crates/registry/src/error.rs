//! Registry error types.

use common::InstanceId;
use thiserror::Error;

/// Errors surfaced by the runtime facade.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The operation name is not in the registry.
    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    /// The operation exists but is not started through `start` (monitors
    /// are attached to, not started).
    #[error("Operation cannot be started directly: {0}")]
    NotStartable(String),

    /// No saga instance or session with this id.
    #[error("Unknown instance: {0}")]
    UnknownInstance(InstanceId),

    /// The co-signing session ended before producing what was asked for.
    #[error("Session ended: {0}")]
    SessionEnded(InstanceId),

    /// The start input could not be deserialized for the operation.
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] serde_json::Error),

    /// A read-only chain query failed.
    #[error("Chain error: {0}")]
    Chain(#[from] chain::ChainError),

    /// The state store could not be read.
    #[error("State store error: {0}")]
    StateStore(#[from] state_store::StateStoreError),
}

/// Convenience type alias for registry results.
pub type Result<T> = std::result::Result<T, RegistryError>;
