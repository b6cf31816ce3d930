//! Injected collaborators shared by all sagas.

use std::sync::Arc;
use std::time::Duration;

use chain::{AuctionSnapshot, BidSnapshot, ChainClient, CredentialVerifier};
use common::{Address, InstanceId};
use monitor::{MonitorConfig, MonitorDirectory, Subscriber};
use state_store::{SagaRecord, StateStore};

use crate::error::Result;
use crate::sources::{AuctionSource, auction_hub_key};

/// Timing knobs for saga suspension points.
#[derive(Debug, Clone, Copy)]
pub struct SagaConfig {
    /// Bounded wait for a resolved resource snapshot; a timeout is treated
    /// as "resource not found".
    pub snapshot_wait: Duration,
    /// How long a co-signing session waits for the external signer.
    /// `None` waits indefinitely — the signer is a human with no SLA.
    pub signature_wait: Option<Duration>,
}

impl Default for SagaConfig {
    fn default() -> Self {
        Self {
            snapshot_wait: Duration::from_secs(60),
            signature_wait: None,
        }
    }
}

/// The collaborators a saga runs against.
///
/// Everything is injected at construction — chain client, credential
/// verifier, state store, monitor directories — so tests substitute fakes
/// and nothing reaches for a global.
pub struct Services<C, V, St> {
    chain: Arc<C>,
    verifier: Arc<V>,
    store: Arc<St>,
    auctions: MonitorDirectory<AuctionSnapshot>,
    bids: MonitorDirectory<BidSnapshot>,
    config: SagaConfig,
}

impl<C, V, St> Clone for Services<C, V, St> {
    fn clone(&self) -> Self {
        Self {
            chain: Arc::clone(&self.chain),
            verifier: Arc::clone(&self.verifier),
            store: Arc::clone(&self.store),
            auctions: self.auctions.clone(),
            bids: self.bids.clone(),
            config: self.config,
        }
    }
}

impl<C, V, St> Services<C, V, St>
where
    C: ChainClient,
    V: CredentialVerifier,
    St: StateStore,
{
    /// Creates the service bundle with fresh monitor directories.
    pub fn new(
        chain: Arc<C>,
        verifier: Arc<V>,
        store: Arc<St>,
        monitor_config: MonitorConfig,
        config: SagaConfig,
    ) -> Self {
        Self {
            chain,
            verifier,
            store,
            auctions: MonitorDirectory::new(monitor_config),
            bids: MonitorDirectory::new(monitor_config),
            config,
        }
    }

    /// The injected chain client.
    pub fn chain(&self) -> &Arc<C> {
        &self.chain
    }

    /// The injected state store.
    pub fn store(&self) -> &Arc<St> {
        &self.store
    }

    /// Directory of auction monitor hubs.
    pub fn auction_monitors(&self) -> &MonitorDirectory<AuctionSnapshot> {
        &self.auctions
    }

    /// Directory of bid monitor hubs.
    pub fn bid_monitors(&self) -> &MonitorDirectory<BidSnapshot> {
        &self.bids
    }

    /// Timing configuration.
    pub fn config(&self) -> &SagaConfig {
        &self.config
    }

    /// Commits the record, mapping store faults into saga errors.
    pub(crate) async fn commit(&self, record: &SagaRecord) -> Result<()> {
        self.store.commit(record).await?;
        Ok(())
    }

    /// Checks that `token` asserts `principal`'s identity. Returns the
    /// rejection message if not; the caller turns that into its terminal
    /// failure before any external side effect happens.
    pub(crate) async fn credential_gate(
        &self,
        token: &str,
        principal: &Address,
    ) -> Option<String> {
        let check = self.verifier.verify(token, principal).await;
        if check.valid {
            None
        } else {
            Some(
                check
                    .message
                    .unwrap_or_else(|| "credential verification failed".to_string()),
            )
        }
    }

    /// Attaches to the auction's monitor hub and waits (bounded) for a
    /// resolved snapshot. `None` means the auction could not be resolved
    /// within the wait — either the hub terminated or the wait timed out.
    pub(crate) async fn await_auction_snapshot(
        &self,
        subscriber_id: InstanceId,
        auction: &Address,
    ) -> Option<AuctionSnapshot> {
        let (subscriber, mut deliveries) = Subscriber::new(subscriber_id);
        let chain = Arc::clone(&self.chain);
        let address = auction.clone();
        self.auctions
            .attach(&auction_hub_key(auction), subscriber, move || {
                AuctionSource::new(chain, address)
            })
            .await;

        match tokio::time::timeout(self.config.snapshot_wait, deliveries.recv()).await {
            Ok(Some(snapshot)) => Some(snapshot),
            // Hub terminated (resource gone) or nothing arrived in time.
            Ok(None) | Err(_) => None,
        }
    }
}
