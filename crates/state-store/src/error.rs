//! State store error types.

use thiserror::Error;

/// Errors that can occur while persisting or loading saga records.
///
/// Unlike step failures, these are host faults: a saga that cannot commit
/// its record propagates the error instead of recording a business failure.
#[derive(Debug, Error)]
pub enum StateStoreError {
    /// Serialization of a step output failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The backing store rejected the operation.
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Convenience type alias for state store results.
pub type Result<T> = std::result::Result<T, StateStoreError>;
