//! Attach-or-create directory of live hubs.

use std::collections::HashMap;
use std::sync::Arc;

use common::Snapshot;
use tokio::sync::Mutex;

use crate::hub::{HubHandle, MonitorConfig, MonitorHub, Subscriber};
use crate::source::SnapshotSource;

/// Directory of monitor hubs keyed by resource ID.
///
/// `attach` is lookup-then-create under a single lock per directory, so two
/// concurrent attaches to the same resource cannot race each other into two
/// hubs, and a dead hub found during lookup is replaced in the same
/// critical section. Entries hold live handles only in the sense that a
/// terminated hub's handle simply fails to accept messages; stale entries
/// are overwritten on the next attach.
pub struct MonitorDirectory<S: Snapshot> {
    hubs: Arc<Mutex<HashMap<String, HubHandle<S>>>>,
    config: MonitorConfig,
}

impl<S: Snapshot> Clone for MonitorDirectory<S> {
    fn clone(&self) -> Self {
        Self {
            hubs: Arc::clone(&self.hubs),
            config: self.config,
        }
    }
}

impl<S: Snapshot> MonitorDirectory<S> {
    /// Creates an empty directory.
    pub fn new(config: MonitorConfig) -> Self {
        Self {
            hubs: Arc::new(Mutex::new(HashMap::new())),
            config,
        }
    }

    /// Attaches a subscriber to the hub for `resource_id`, starting one
    /// seeded with the subscriber if none is running. `make_source` is only
    /// called when a hub actually has to be started.
    pub async fn attach<Src>(
        &self,
        resource_id: &str,
        subscriber: Subscriber<S>,
        make_source: impl FnOnce() -> Src,
    ) -> HubHandle<S>
    where
        Src: SnapshotSource<Snapshot = S>,
    {
        let mut hubs = self.hubs.lock().await;

        let subscriber = match hubs.get(resource_id) {
            Some(handle) => match handle.register(subscriber).await {
                Ok(()) => return handle.clone(),
                // The hub terminated between cycles; seed a fresh one with
                // the subscriber it handed back.
                Err(subscriber) => subscriber,
            },
            None => subscriber,
        };

        let handle = MonitorHub::spawn(resource_id, make_source(), subscriber, self.config);
        hubs.insert(resource_id.to_string(), handle.clone());
        handle
    }

    /// Nudges the hub for `resource_id` to re-fetch immediately. Returns
    /// false when no live hub exists; that is not an error for callers.
    pub async fn refresh(&self, resource_id: &str) -> bool {
        let hubs = self.hubs.lock().await;
        match hubs.get(resource_id) {
            Some(handle) => handle.refresh_now().await,
            None => false,
        }
    }

    /// Number of directory entries whose hub still accepts messages.
    pub async fn live_hub_count(&self) -> usize {
        let hubs = self.hubs.lock().await;
        hubs.values().filter(|handle| !handle.is_closed()).count()
    }

    /// Operator shutdown of every live hub, with best-effort final
    /// deliveries.
    pub async fn shutdown_all(&self) {
        let mut hubs = self.hubs.lock().await;
        for (_, handle) in hubs.drain() {
            handle.shutdown().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{FetchFault, SnapshotSource};
    use async_trait::async_trait;
    use common::InstanceId;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq)]
    struct TestSnap {
        id: String,
        value: u32,
    }

    impl Snapshot for TestSnap {
        fn is_resolved(&self) -> bool {
            !self.id.is_empty()
        }
    }

    /// Source yielding an incrementing value, or absence once switched off.
    #[derive(Clone, Default)]
    struct CountingSource {
        state: Arc<StdMutex<(u32, bool)>>,
    }

    impl CountingSource {
        fn shut_off(&self) {
            self.state.lock().unwrap().1 = true;
        }
    }

    #[async_trait]
    impl SnapshotSource for CountingSource {
        type Snapshot = TestSnap;

        async fn fetch(&self) -> Result<Option<TestSnap>, FetchFault> {
            let mut state = self.state.lock().unwrap();
            if state.1 {
                return Ok(None);
            }
            state.0 += 1;
            Ok(Some(TestSnap {
                id: "resource-1".to_string(),
                value: state.0,
            }))
        }
    }

    fn long_config() -> MonitorConfig {
        MonitorConfig {
            refresh_interval: Duration::from_secs(600),
            idle_timeout: Duration::from_secs(600),
        }
    }

    #[tokio::test]
    async fn attach_reuses_existing_hub() {
        let directory: MonitorDirectory<TestSnap> = MonitorDirectory::new(long_config());
        let source = CountingSource::default();

        let (first, mut first_rx) = Subscriber::new(InstanceId::new());
        let handle = directory
            .attach("resource-1", first, || source.clone())
            .await;
        assert_eq!(first_rx.recv().await.unwrap().value, 1);

        let (second, mut second_rx) = Subscriber::new(InstanceId::new());
        directory
            .attach("resource-1", second, || source.clone())
            .await;

        // Same hub: the late attach gets the cached snapshot, not a second
        // fetch, and the directory still holds a single live hub.
        assert_eq!(second_rx.recv().await.unwrap().value, 1);
        assert_eq!(directory.live_hub_count().await, 1);
        assert_eq!(handle.subscriber_count().await, Some(2));
    }

    #[tokio::test]
    async fn attach_replaces_dead_hub() {
        let directory: MonitorDirectory<TestSnap> = MonitorDirectory::new(long_config());
        let source = CountingSource::default();

        let (first, mut first_rx) = Subscriber::new(InstanceId::new());
        let handle = directory
            .attach("resource-1", first, || source.clone())
            .await;
        assert_eq!(first_rx.recv().await.unwrap().value, 1);

        // Resource disappears; the hub terminates on its next fetch.
        source.shut_off();
        handle.refresh_now().await;
        assert!(first_rx.recv().await.is_none());

        // Re-attaching finds the dead entry and seeds a fresh hub. The
        // resource is back, so the new hub serves it.
        let revived = CountingSource::default();
        let (second, mut second_rx) = Subscriber::new(InstanceId::new());
        directory
            .attach("resource-1", second, || revived.clone())
            .await;
        assert_eq!(second_rx.recv().await.unwrap().value, 1);
        assert_eq!(directory.live_hub_count().await, 1);
    }

    #[tokio::test]
    async fn refresh_reports_whether_anyone_listened() {
        let directory: MonitorDirectory<TestSnap> = MonitorDirectory::new(long_config());
        assert!(!directory.refresh("resource-1").await);

        let source = CountingSource::default();
        let (sub, mut rx) = Subscriber::new(InstanceId::new());
        directory.attach("resource-1", sub, || source.clone()).await;
        assert_eq!(rx.recv().await.unwrap().value, 1);

        assert!(directory.refresh("resource-1").await);
        assert_eq!(rx.recv().await.unwrap().value, 2);
    }

    #[tokio::test]
    async fn shutdown_all_final_delivers_and_clears() {
        let directory: MonitorDirectory<TestSnap> = MonitorDirectory::new(long_config());
        let source = CountingSource::default();

        let (sub, mut rx) = Subscriber::new(InstanceId::new());
        directory.attach("resource-1", sub, || source.clone()).await;
        assert_eq!(rx.recv().await.unwrap().value, 1);

        directory.shutdown_all().await;
        // Best-effort final delivery of the last known snapshot.
        assert_eq!(rx.recv().await.unwrap().value, 1);
        assert!(rx.recv().await.is_none());
        assert_eq!(directory.live_hub_count().await, 0);
    }
}
