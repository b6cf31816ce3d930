//! The snapshot source trait.

use async_trait::async_trait;
use common::Snapshot;
use thiserror::Error;

/// A transient fetch fault.
///
/// The hub logs these and keeps serving its previous snapshot; only a
/// definitive `Ok(None)` ends monitoring.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct FetchFault(pub String);

/// Fetches the current state of one tracked resource.
///
/// A source is bound to its resource at construction; the hub just calls
/// `fetch` each cycle. `Ok(Some(..))` is the current state, `Ok(None)`
/// means the resource definitively does not exist any more.
#[async_trait]
pub trait SnapshotSource: Send + Sync + 'static {
    type Snapshot: Snapshot;

    async fn fetch(&self) -> Result<Option<Self::Snapshot>, FetchFault>;
}
