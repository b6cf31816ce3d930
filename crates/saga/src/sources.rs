//! Snapshot sources backed by the chain client, and hub key naming.

use std::sync::Arc;

use async_trait::async_trait;
use chain::{AuctionSnapshot, BidSnapshot, ChainClient};
use common::Address;
use monitor::{FetchFault, SnapshotSource};

/// Directory key for the hub tracking an auction account.
pub fn auction_hub_key(auction: &Address) -> String {
    format!("monitor-auction-{auction}")
}

/// Directory key for the hub tracking one bidder's position.
pub fn bid_hub_key(auction: &Address, bidder: &Address) -> String {
    format!("monitor-bid-{auction}-{bidder}")
}

/// Fetches one auction's snapshot through the chain client.
pub struct AuctionSource<C> {
    chain: Arc<C>,
    auction: Address,
}

impl<C> AuctionSource<C> {
    pub fn new(chain: Arc<C>, auction: Address) -> Self {
        Self { chain, auction }
    }
}

#[async_trait]
impl<C: ChainClient> SnapshotSource for AuctionSource<C> {
    type Snapshot = AuctionSnapshot;

    async fn fetch(&self) -> Result<Option<AuctionSnapshot>, FetchFault> {
        self.chain
            .auction_snapshot(&self.auction)
            .await
            .map_err(|err| FetchFault(err.to_string()))
    }
}

/// Fetches one bidder's position through the chain client.
pub struct BidSource<C> {
    chain: Arc<C>,
    auction: Address,
    bidder: Address,
}

impl<C> BidSource<C> {
    pub fn new(chain: Arc<C>, auction: Address, bidder: Address) -> Self {
        Self {
            chain,
            auction,
            bidder,
        }
    }
}

#[async_trait]
impl<C: ChainClient> SnapshotSource for BidSource<C> {
    type Snapshot = BidSnapshot;

    async fn fetch(&self) -> Result<Option<BidSnapshot>, FetchFault> {
        self.chain
            .bid_snapshot(&self.auction, &self.bidder)
            .await
            .map_err(|err| FetchFault(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hub_keys_are_stable() {
        let auction = Address::from("auction-1");
        let bidder = Address::from("bidder-1");
        assert_eq!(auction_hub_key(&auction), "monitor-auction-auction-1");
        assert_eq!(
            bid_hub_key(&auction, &bidder),
            "monitor-bid-auction-1-bidder-1"
        );
    }
}
