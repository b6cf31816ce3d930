//! The runtime facade over sagas, sessions and monitors.

use std::sync::Arc;

use chain::{AuctionFilter, AuctionPage, AuctionSnapshot, BidSnapshot, ChainClient,
    CredentialVerifier, TokenMetadata, UnsignedArtifact};
use chrono::{DateTime, Utc};
use common::{Address, InstanceId};
use saga::sources::{auction_hub_key, bid_hub_key, AuctionSource, BidSource};
use saga::{
    BidSession, CreateAuctionInput, PlaceBidInput, RefundInput, Services, SignatureAck,
    WithdrawInput, steps,
};
use serde::{Deserialize, Serialize};
use state_store::{SagaRecord, SagaStatus, StateStore};
use tokio::sync::mpsc;

use crate::config::Config;
use crate::error::{RegistryError, Result};
use crate::operations;
use crate::sessions::SessionDirectory;

/// What a status query reports about a saga instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusReport {
    pub instance_id: InstanceId,
    pub saga_type: String,
    pub status: SagaStatus,
    /// `running:{step}` while in flight, the terminal status afterwards.
    pub status_line: String,
    pub failure_message: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<SagaRecord> for StatusReport {
    fn from(record: SagaRecord) -> Self {
        let status_line = record.status_line();
        Self {
            instance_id: record.instance_id,
            saga_type: record.saga_type,
            status: record.status,
            status_line,
            failure_message: record.failure_message,
            updated_at: record.updated_at,
        }
    }
}

/// The upward interface of the orchestration layer.
///
/// Starting an operation spawns its saga task and returns the instance id
/// immediately; progress is observed through [`Runtime::status`], which
/// reads the persisted record, never the running task. Co-signing sessions
/// are additionally reachable through the session directory while they are
/// suspended on the external signer.
pub struct Runtime<C, V, St> {
    services: Services<C, V, St>,
    sessions: SessionDirectory,
}

impl<C, V, St> Clone for Runtime<C, V, St> {
    fn clone(&self) -> Self {
        Self {
            services: self.services.clone(),
            sessions: self.sessions.clone(),
        }
    }
}

impl<C, V, St> Runtime<C, V, St>
where
    C: ChainClient,
    V: CredentialVerifier,
    St: StateStore,
{
    /// Builds a runtime from injected collaborators and configuration.
    pub fn new(chain: Arc<C>, verifier: Arc<V>, store: Arc<St>, config: &Config) -> Self {
        let services = Services::new(
            chain,
            verifier,
            store,
            config.monitor_config(),
            config.saga_config(),
        );
        Self {
            services,
            sessions: SessionDirectory::new(),
        }
    }

    /// The service bundle the runtime dispatches into.
    pub fn services(&self) -> &Services<C, V, St> {
        &self.services
    }

    /// Starts an operation by registry name with a JSON input.
    pub fn start(&self, name: &str, input: serde_json::Value) -> Result<InstanceId> {
        let op = operations::operation(name)
            .ok_or_else(|| RegistryError::UnknownOperation(name.to_string()))?;
        match op.name {
            steps::CREATE_AUCTION => Ok(self.start_create_auction(serde_json::from_value(input)?)),
            steps::PLACE_BID => Ok(self.start_place_bid(serde_json::from_value(input)?)),
            steps::REFUND => Ok(self.start_refund(serde_json::from_value(input)?)),
            steps::WITHDRAW => Ok(self.start_withdraw(serde_json::from_value(input)?)),
            // Monitors are attached to through watch_auction / watch_bid.
            other => Err(RegistryError::NotStartable(other.to_string())),
        }
    }

    /// Spawns a create-auction saga and returns its instance id.
    pub fn start_create_auction(&self, input: CreateAuctionInput) -> InstanceId {
        let instance_id = InstanceId::new();
        let services = self.services.clone();
        tokio::spawn(async move {
            if let Err(err) = services.create_auction(instance_id, input).await {
                tracing::error!(error = %err, %instance_id, "create-auction saga aborted");
            }
        });
        instance_id
    }

    /// Spawns a refund saga and returns its instance id.
    pub fn start_refund(&self, input: RefundInput) -> InstanceId {
        let instance_id = InstanceId::new();
        let services = self.services.clone();
        tokio::spawn(async move {
            if let Err(err) = services.refund(instance_id, input).await {
                tracing::error!(error = %err, %instance_id, "refund saga aborted");
            }
        });
        instance_id
    }

    /// Spawns a withdraw saga and returns its instance id.
    pub fn start_withdraw(&self, input: WithdrawInput) -> InstanceId {
        let instance_id = InstanceId::new();
        let services = self.services.clone();
        tokio::spawn(async move {
            if let Err(err) = services.withdraw(instance_id, input).await {
                tracing::error!(error = %err, %instance_id, "withdraw saga aborted");
            }
        });
        instance_id
    }

    /// Spawns a place-bid session and returns its instance id. The session
    /// stays addressable through [`Runtime::unsigned_artifact`] and
    /// [`Runtime::submit_signed`] until its run ends.
    pub fn start_place_bid(&self, input: PlaceBidInput) -> InstanceId {
        let instance_id = InstanceId::new();
        let (session, handle) = BidSession::new(self.services.clone(), instance_id, input);
        self.sessions.insert(instance_id, handle);
        let sessions = self.sessions.clone();
        tokio::spawn(async move {
            if let Err(err) = session.run().await {
                tracing::error!(error = %err, %instance_id, "place-bid saga aborted");
            }
            sessions.remove(instance_id);
        });
        instance_id
    }

    /// Reads a saga instance's persisted status.
    pub async fn status(&self, instance_id: InstanceId) -> Result<StatusReport> {
        let record = self
            .services
            .store()
            .load(instance_id)
            .await?
            .ok_or(RegistryError::UnknownInstance(instance_id))?;
        Ok(StatusReport::from(record))
    }

    /// Waits for a live bid session's unsigned transaction.
    pub async fn unsigned_artifact(&self, instance_id: InstanceId) -> Result<UnsignedArtifact> {
        let handle = self
            .sessions
            .get(instance_id)
            .ok_or(RegistryError::UnknownInstance(instance_id))?;
        handle
            .unsigned_artifact()
            .await
            .ok_or(RegistryError::SessionEnded(instance_id))
    }

    /// Hands a signed transaction to a live bid session. First writer wins;
    /// later signatures are acknowledged as rejected.
    pub fn submit_signed(
        &self,
        instance_id: InstanceId,
        signed: impl Into<String>,
    ) -> Result<SignatureAck> {
        let handle = self
            .sessions
            .get(instance_id)
            .ok_or(RegistryError::UnknownInstance(instance_id))?;
        Ok(handle.submit_signature(signed))
    }

    /// Lists auctions matching a filter. Read-only chain pass-through.
    pub async fn list_auctions(&self, filter: &AuctionFilter) -> Result<AuctionPage> {
        Ok(self.services.chain().list_auctions(filter).await?)
    }

    /// Fetches one auction's current state. Read-only chain pass-through.
    pub async fn auction_details(&self, auction: &Address) -> Result<Option<AuctionSnapshot>> {
        Ok(self.services.chain().auction_snapshot(auction).await?)
    }

    /// Principals allowed to create auctions. Read-only chain pass-through.
    pub async fn allowed_creators(&self) -> Result<Vec<Address>> {
        Ok(self.services.chain().allowed_creators().await?)
    }

    /// Accepted payment token mints. Read-only chain pass-through.
    pub async fn accepted_token_mints(&self) -> Result<Vec<TokenMetadata>> {
        Ok(self.services.chain().accepted_token_mints().await?)
    }

    /// Subscribes to an auction's live snapshots, starting its monitor hub
    /// if none is running.
    pub async fn watch_auction(&self, auction: &Address) -> mpsc::Receiver<AuctionSnapshot> {
        let (subscriber, deliveries) = monitor::Subscriber::new(InstanceId::new());
        let chain = Arc::clone(self.services.chain());
        let address = auction.clone();
        self.services
            .auction_monitors()
            .attach(&auction_hub_key(auction), subscriber, move || {
                AuctionSource::new(chain, address)
            })
            .await;
        deliveries
    }

    /// Subscribes to one bidder's position on an auction.
    pub async fn watch_bid(
        &self,
        auction: &Address,
        bidder: &Address,
    ) -> mpsc::Receiver<BidSnapshot> {
        let (subscriber, deliveries) = monitor::Subscriber::new(InstanceId::new());
        let chain = Arc::clone(self.services.chain());
        let auction_addr = auction.clone();
        let bidder_addr = bidder.clone();
        self.services
            .bid_monitors()
            .attach(&bid_hub_key(auction, bidder), subscriber, move || {
                BidSource::new(chain, auction_addr, bidder_addr)
            })
            .await;
        deliveries
    }

    /// Nudges an auction's hub to re-fetch now. False when none is live.
    pub async fn refresh_auction(&self, auction: &Address) -> bool {
        self.services
            .auction_monitors()
            .refresh(&auction_hub_key(auction))
            .await
    }

    /// Nudges a bid hub to re-fetch now. False when none is live.
    pub async fn refresh_bid(&self, auction: &Address, bidder: &Address) -> bool {
        self.services
            .bid_monitors()
            .refresh(&bid_hub_key(auction, bidder))
            .await
    }

    /// Shuts down every monitor hub with best-effort final deliveries.
    pub async fn shutdown(&self) {
        self.services.auction_monitors().shutdown_all().await;
        self.services.bid_monitors().shutdown_all().await;
    }
}
