//! The chain client trait.

use async_trait::async_trait;
use common::Address;

use crate::error::Result;
use crate::types::{
    AuctionFilter, AuctionPage, AuctionSnapshot, AuthorityUpdated, BidSnapshot, CollectionCreated,
    Creator, InitializeAuctionParams, Proof, RefundParams, SubmissionRef, TokenMetadata,
    UnsignedArtifact,
};

/// Idempotent, retryable chain operations consumed by the orchestration
/// layer.
///
/// Snapshot fetches make a three-way distinction the monitor hub depends
/// on: `Ok(Some(..))` is the current state, `Ok(None)` means the resource
/// definitively does not exist, and `Err(..)` is a transient fault (the
/// caller keeps whatever state it already had).
#[async_trait]
pub trait ChainClient: Send + Sync + 'static {
    /// Mints the collection NFT an auction's items will belong to.
    async fn create_collection(
        &self,
        name: &str,
        description: &str,
        owner: &Address,
        creators: &[Creator],
    ) -> Result<CollectionCreated>;

    /// Marks the collection as verified on chain.
    async fn verify_collection(&self, collection_mint: &Address) -> Result<SubmissionRef>;

    /// Hands collection authority to the auction program, deriving the
    /// auction PDA in the process.
    async fn update_collection_authority(
        &self,
        collection_mint: &Address,
        authority: &Address,
        merkle_tree: &Address,
    ) -> Result<AuthorityUpdated>;

    /// Initializes the auction account.
    async fn initialize_auction(&self, params: &InitializeAuctionParams)
    -> Result<SubmissionRef>;

    /// Fetches the current state of an auction account.
    async fn auction_snapshot(&self, auction: &Address) -> Result<Option<AuctionSnapshot>>;

    /// Fetches one bidder's position on an auction.
    async fn bid_snapshot(
        &self,
        auction: &Address,
        bidder: &Address,
    ) -> Result<Option<BidSnapshot>>;

    /// Lists auctions matching a filter, with paging.
    async fn list_auctions(&self, filter: &AuctionFilter) -> Result<AuctionPage>;

    /// Principals allowed to create auctions.
    async fn allowed_creators(&self) -> Result<Vec<Address>>;

    /// Payment token mints the auction program accepts.
    async fn accepted_token_mints(&self) -> Result<Vec<TokenMetadata>>;

    /// Builds an unsigned bid transaction for an external signer.
    async fn prepare_bid_artifact(
        &self,
        auction: &Address,
        bidder: &Address,
        amount: u64,
    ) -> Result<UnsignedArtifact>;

    /// Submits a transaction signed by the external actor.
    async fn submit_signed_artifact(&self, signed: &str) -> Result<SubmissionRef>;

    /// Collects the ownership proofs backing a bidder's refundable items.
    /// A bidder with nothing to refund gets an empty list, not an error.
    async fn gather_proofs(&self, collection_mint: &Address, bidder: &Address)
    -> Result<Vec<Proof>>;

    /// Refunds one proven item.
    async fn refund(&self, params: &RefundParams) -> Result<SubmissionRef>;

    /// Withdraws auction funds to the authority and creators.
    async fn withdraw(
        &self,
        auction: &Address,
        authority: &Address,
        collection_mint: &Address,
        creators: &[Creator],
        token_mint: &Address,
    ) -> Result<SubmissionRef>;
}
