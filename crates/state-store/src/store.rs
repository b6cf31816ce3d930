//! The state store trait.

use async_trait::async_trait;
use common::InstanceId;

use crate::error::Result;
use crate::record::SagaRecord;

/// Durable storage for saga records.
///
/// `commit` overwrites the whole record — records are single-writer, so
/// last-write-wins per instance is exactly the intended semantics.
#[async_trait]
pub trait StateStore: Send + Sync + 'static {
    /// Persists the current state of a saga run.
    async fn commit(&self, record: &SagaRecord) -> Result<()>;

    /// Loads the persisted state of a saga run, if any.
    async fn load(&self, instance_id: InstanceId) -> Result<Option<SagaRecord>>;
}
