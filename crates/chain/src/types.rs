//! Value objects crossing the chain boundary.

use common::{Address, Snapshot};
use serde::{Deserialize, Serialize};

/// A royalty recipient on a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creator {
    pub address: Address,
    pub verified: bool,
    /// Royalty share in percent, all creators summing to 100.
    pub share: u8,
}

/// Observable state of an auction account, fetched fresh each cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuctionSnapshot {
    pub address: Address,
    pub authority: Address,
    pub collection_mint: Address,
    pub merkle_tree: Address,
    /// Payment token mint. Empty until the auction account is initialized,
    /// which is why it doubles as the resolution marker.
    pub token_mint: Address,
    pub creators: Vec<Creator>,
    pub base_price: u64,
    pub price_increment: u64,
    pub current_supply: u64,
    pub max_supply: u64,
    pub total_value_locked: u64,
    pub minimum_items: u64,
    /// Unix timestamp in seconds.
    pub deadline: i64,
    pub is_graduated: bool,
    pub current_price: u64,
}

impl Snapshot for AuctionSnapshot {
    fn is_resolved(&self) -> bool {
        !self.token_mint.is_empty()
    }
}

/// Observable state of one bidder's position on an auction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BidSnapshot {
    /// The bid account address; empty until the account exists.
    pub address: Address,
    pub auction: Address,
    pub bidder: Address,
    pub amount: u64,
    pub count: u64,
}

impl Snapshot for BidSnapshot {
    fn is_resolved(&self) -> bool {
        !self.address.is_empty()
    }
}

/// Filter and paging for auction listings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuctionFilter {
    pub authority: Option<Address>,
    pub is_graduated: Option<bool>,
    pub limit: usize,
    pub offset: usize,
}

/// One page of auction listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuctionPage {
    pub auctions: Vec<AuctionSnapshot>,
    pub total: usize,
}

/// Metadata of a payment token the auction program accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub mint: Address,
    pub name: String,
    pub symbol: String,
    pub uri: String,
    pub decimals: u8,
}

/// Result of creating a collection NFT.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionCreated {
    pub collection_mint: Address,
    pub merkle_tree: Address,
    pub tx_ref: String,
}

/// Result of handing collection authority to the auction program.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorityUpdated {
    /// The auction PDA derived while transferring authority.
    pub auction_address: Address,
    pub tx_ref: String,
}

/// Parameters for initializing an auction account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializeAuctionParams {
    pub auction_address: Address,
    pub owner: Address,
    pub collection_mint: Address,
    pub merkle_tree: Address,
    pub base_price: u64,
    pub price_increment: u64,
    pub max_supply: u64,
    pub minimum_items: u64,
    /// Unix timestamp in seconds.
    pub deadline: i64,
    pub token_mint: Address,
}

/// An unsigned transaction prepared for an external signer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedArtifact {
    /// Base64-encoded serialized transaction.
    pub transaction: String,
    /// Height after which the transaction can no longer land.
    pub last_valid_block_height: u64,
}

/// Reference to a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRef {
    pub signature: String,
}

/// A compressed-NFT ownership proof backing one refundable item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    pub proof_accounts: Vec<Address>,
    pub hashes: Vec<String>,
}

/// Parameters for refunding one proven item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundParams {
    pub auction: Address,
    pub token_mint: Address,
    pub bidder: Address,
    pub merkle_tree: Address,
    pub proof: Proof,
}
