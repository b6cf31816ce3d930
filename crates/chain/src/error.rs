//! Chain boundary error type.

use thiserror::Error;

/// Errors surfaced by chain activity calls.
///
/// These are expected business outcomes, not host faults: a saga treats an
/// `Err` from the chain client as the failing step's tagged result and
/// short-circuits, it never panics or retries.
#[derive(Debug, Error)]
pub enum ChainError {
    /// The RPC endpoint could not be reached or timed out.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// The submitted transaction was rejected by the chain.
    #[error("Transaction rejected: {0}")]
    TransactionRejected(String),

    /// The on-chain program refused the operation.
    #[error("Program error: {0}")]
    Program(String),

    /// The request itself was malformed (bad address, bad amount).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Convenience type alias for chain call results.
pub type Result<T> = std::result::Result<T, ChainError>;
