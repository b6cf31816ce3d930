//! Saga error types.

use thiserror::Error;

/// Host faults during saga execution.
///
/// Business failures (a rejected transaction, an invalid credential, a
/// missing auction) are never errors here — they become the saga's failed
/// terminal result. `SagaError` is reserved for faults of the substrate
/// itself, currently only the state store.
#[derive(Debug, Error)]
pub enum SagaError {
    /// Persisting or serializing the saga record failed.
    #[error("State store error: {0}")]
    StateStore(#[from] state_store::StateStoreError),
}

/// Convenience type alias for saga results.
pub type Result<T> = std::result::Result<T, SagaError>;
