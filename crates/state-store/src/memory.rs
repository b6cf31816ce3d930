//! In-memory state store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::InstanceId;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::record::SagaRecord;
use crate::store::StateStore;

/// In-memory state store implementation.
///
/// Keeps every record in a map keyed by instance ID. Used by tests and by
/// deployments that accept losing in-flight saga state on restart.
#[derive(Clone, Default)]
pub struct InMemoryStateStore {
    records: Arc<RwLock<HashMap<InstanceId, SagaRecord>>>,
}

impl InMemoryStateStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of records stored.
    pub async fn record_count(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn commit(&self, record: &SagaRecord) -> Result<()> {
        self.records
            .write()
            .await
            .insert(record.instance_id, record.clone());
        Ok(())
    }

    async fn load(&self, instance_id: InstanceId) -> Result<Option<SagaRecord>> {
        Ok(self.records.read().await.get(&instance_id).cloned())
    }
}
