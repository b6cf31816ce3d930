//! In-memory chain client and verifier for tests.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::Address;

use crate::client::ChainClient;
use crate::credential::{CredentialCheck, CredentialVerifier};
use crate::error::{ChainError, Result};
use crate::types::{
    AuctionFilter, AuctionPage, AuctionSnapshot, AuthorityUpdated, BidSnapshot, CollectionCreated,
    Creator, InitializeAuctionParams, Proof, RefundParams, SubmissionRef, TokenMetadata,
    UnsignedArtifact,
};

#[derive(Debug, Default)]
struct FakeChainState {
    auctions: HashMap<Address, AuctionSnapshot>,
    bids: HashMap<(Address, Address), BidSnapshot>,
    proofs: HashMap<(Address, Address), Vec<Proof>>,
    allowed_creators: Vec<Address>,
    accepted_token_mints: Vec<TokenMetadata>,
    submitted: Vec<String>,
    refunds: Vec<RefundParams>,
    withdrawals: Vec<Address>,
    next_id: u32,
    /// Number of upcoming snapshot fetches that fail transiently.
    fetch_faults: u32,
    fail_on_create_collection: bool,
    fail_on_verify_collection: bool,
    fail_on_update_authority: bool,
    fail_on_initialize: bool,
    fail_on_prepare_bid: bool,
    fail_on_submit: bool,
    fail_on_refund: bool,
    fail_on_withdraw: bool,
    initialize_calls: u32,
}

/// In-memory chain client for testing.
///
/// Holds scripted auction/bid snapshots and proof sets, with per-operation
/// failure switches mirroring the chain's expected business failures.
#[derive(Debug, Clone, Default)]
pub struct FakeChain {
    state: Arc<RwLock<FakeChainState>>,
}

impl FakeChain {
    /// Creates a new empty fake chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the snapshot returned for an auction address.
    pub fn set_auction(&self, snapshot: AuctionSnapshot) {
        let mut state = self.state.write().unwrap();
        state.auctions.insert(snapshot.address.clone(), snapshot);
    }

    /// Removes an auction, making fetches report definitive absence.
    pub fn remove_auction(&self, auction: &Address) {
        self.state.write().unwrap().auctions.remove(auction);
    }

    /// Scripts the snapshot returned for a bidder's position.
    pub fn set_bid(&self, snapshot: BidSnapshot) {
        let mut state = self.state.write().unwrap();
        let key = (snapshot.auction.clone(), snapshot.bidder.clone());
        state.bids.insert(key, snapshot);
    }

    /// Scripts the proofs returned for a collection/bidder pair.
    pub fn set_proofs(&self, collection_mint: Address, bidder: Address, proofs: Vec<Proof>) {
        let mut state = self.state.write().unwrap();
        state.proofs.insert((collection_mint, bidder), proofs);
    }

    /// Scripts the allow-listed creator principals.
    pub fn set_allowed_creators(&self, creators: Vec<Address>) {
        self.state.write().unwrap().allowed_creators = creators;
    }

    /// Scripts the accepted payment token mints.
    pub fn set_accepted_token_mints(&self, mints: Vec<TokenMetadata>) {
        self.state.write().unwrap().accepted_token_mints = mints;
    }

    /// Makes the next `count` snapshot fetches fail transiently.
    pub fn fail_next_fetches(&self, count: u32) {
        self.state.write().unwrap().fetch_faults = count;
    }

    pub fn set_fail_on_create_collection(&self, fail: bool) {
        self.state.write().unwrap().fail_on_create_collection = fail;
    }

    pub fn set_fail_on_verify_collection(&self, fail: bool) {
        self.state.write().unwrap().fail_on_verify_collection = fail;
    }

    pub fn set_fail_on_update_authority(&self, fail: bool) {
        self.state.write().unwrap().fail_on_update_authority = fail;
    }

    pub fn set_fail_on_initialize(&self, fail: bool) {
        self.state.write().unwrap().fail_on_initialize = fail;
    }

    pub fn set_fail_on_prepare_bid(&self, fail: bool) {
        self.state.write().unwrap().fail_on_prepare_bid = fail;
    }

    pub fn set_fail_on_submit(&self, fail: bool) {
        self.state.write().unwrap().fail_on_submit = fail;
    }

    pub fn set_fail_on_refund(&self, fail: bool) {
        self.state.write().unwrap().fail_on_refund = fail;
    }

    pub fn set_fail_on_withdraw(&self, fail: bool) {
        self.state.write().unwrap().fail_on_withdraw = fail;
    }

    /// Returns the signed payloads submitted so far.
    pub fn submitted(&self) -> Vec<String> {
        self.state.read().unwrap().submitted.clone()
    }

    /// Returns the number of signed submissions so far.
    pub fn submit_count(&self) -> usize {
        self.state.read().unwrap().submitted.len()
    }

    /// Returns the number of refund calls so far.
    pub fn refund_count(&self) -> usize {
        self.state.read().unwrap().refunds.len()
    }

    /// Returns the number of withdraw calls so far.
    pub fn withdraw_count(&self) -> usize {
        self.state.read().unwrap().withdrawals.len()
    }

    /// Returns the number of initialize-auction calls so far.
    pub fn initialize_count(&self) -> u32 {
        self.state.read().unwrap().initialize_calls
    }

    fn next_id(state: &mut FakeChainState) -> u32 {
        state.next_id += 1;
        state.next_id
    }
}

#[async_trait]
impl ChainClient for FakeChain {
    async fn create_collection(
        &self,
        _name: &str,
        _description: &str,
        _owner: &Address,
        _creators: &[Creator],
    ) -> Result<CollectionCreated> {
        let mut state = self.state.write().unwrap();
        if state.fail_on_create_collection {
            return Err(ChainError::TransactionRejected(
                "collection mint failed".to_string(),
            ));
        }
        let n = Self::next_id(&mut state);
        Ok(CollectionCreated {
            collection_mint: Address::new(format!("collection-{n:04}")),
            merkle_tree: Address::new(format!("tree-{n:04}")),
            tx_ref: format!("tx-{n:04}"),
        })
    }

    async fn verify_collection(&self, _collection_mint: &Address) -> Result<SubmissionRef> {
        let mut state = self.state.write().unwrap();
        if state.fail_on_verify_collection {
            return Err(ChainError::Program(
                "collection verification failed".to_string(),
            ));
        }
        let n = Self::next_id(&mut state);
        Ok(SubmissionRef {
            signature: format!("sig-{n:04}"),
        })
    }

    async fn update_collection_authority(
        &self,
        collection_mint: &Address,
        _authority: &Address,
        _merkle_tree: &Address,
    ) -> Result<AuthorityUpdated> {
        let mut state = self.state.write().unwrap();
        if state.fail_on_update_authority {
            return Err(ChainError::Program("authority update failed".to_string()));
        }
        let n = Self::next_id(&mut state);
        Ok(AuthorityUpdated {
            auction_address: Address::new(format!("auction-for-{}", collection_mint)),
            tx_ref: format!("tx-{n:04}"),
        })
    }

    async fn initialize_auction(
        &self,
        params: &InitializeAuctionParams,
    ) -> Result<SubmissionRef> {
        let mut state = self.state.write().unwrap();
        state.initialize_calls += 1;
        if state.fail_on_initialize {
            return Err(ChainError::TransactionRejected(
                "initialize rejected".to_string(),
            ));
        }
        let n = Self::next_id(&mut state);
        // The initialized account becomes fetchable as a resolved snapshot.
        state.auctions.insert(
            params.auction_address.clone(),
            AuctionSnapshot {
                address: params.auction_address.clone(),
                authority: params.owner.clone(),
                collection_mint: params.collection_mint.clone(),
                merkle_tree: params.merkle_tree.clone(),
                token_mint: params.token_mint.clone(),
                creators: Vec::new(),
                base_price: params.base_price,
                price_increment: params.price_increment,
                current_supply: 0,
                max_supply: params.max_supply,
                total_value_locked: 0,
                minimum_items: params.minimum_items,
                deadline: params.deadline,
                is_graduated: false,
                current_price: params.base_price,
            },
        );
        Ok(SubmissionRef {
            signature: format!("sig-{n:04}"),
        })
    }

    async fn auction_snapshot(&self, auction: &Address) -> Result<Option<AuctionSnapshot>> {
        let mut state = self.state.write().unwrap();
        if state.fetch_faults > 0 {
            state.fetch_faults -= 1;
            return Err(ChainError::Rpc("connection reset".to_string()));
        }
        Ok(state.auctions.get(auction).cloned())
    }

    async fn bid_snapshot(
        &self,
        auction: &Address,
        bidder: &Address,
    ) -> Result<Option<BidSnapshot>> {
        let mut state = self.state.write().unwrap();
        if state.fetch_faults > 0 {
            state.fetch_faults -= 1;
            return Err(ChainError::Rpc("connection reset".to_string()));
        }
        Ok(state.bids.get(&(auction.clone(), bidder.clone())).cloned())
    }

    async fn list_auctions(&self, filter: &AuctionFilter) -> Result<AuctionPage> {
        let state = self.state.read().unwrap();
        let mut matching: Vec<AuctionSnapshot> = state
            .auctions
            .values()
            .filter(|a| {
                filter
                    .authority
                    .as_ref()
                    .is_none_or(|auth| &a.authority == auth)
            })
            .filter(|a| filter.is_graduated.is_none_or(|g| a.is_graduated == g))
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.address.as_str().cmp(b.address.as_str()));

        let total = matching.len();
        let auctions = matching
            .into_iter()
            .skip(filter.offset)
            .take(if filter.limit == 0 { 10 } else { filter.limit })
            .collect();
        Ok(AuctionPage { auctions, total })
    }

    async fn allowed_creators(&self) -> Result<Vec<Address>> {
        Ok(self.state.read().unwrap().allowed_creators.clone())
    }

    async fn accepted_token_mints(&self) -> Result<Vec<TokenMetadata>> {
        Ok(self.state.read().unwrap().accepted_token_mints.clone())
    }

    async fn prepare_bid_artifact(
        &self,
        auction: &Address,
        bidder: &Address,
        amount: u64,
    ) -> Result<UnsignedArtifact> {
        let state = self.state.read().unwrap();
        if state.fail_on_prepare_bid {
            return Err(ChainError::InvalidRequest(
                "could not build bid transaction".to_string(),
            ));
        }
        Ok(UnsignedArtifact {
            transaction: format!("unsigned:{auction}:{bidder}:{amount}"),
            last_valid_block_height: 1_000,
        })
    }

    async fn submit_signed_artifact(&self, signed: &str) -> Result<SubmissionRef> {
        let mut state = self.state.write().unwrap();
        if state.fail_on_submit {
            return Err(ChainError::TransactionRejected(
                "signed transaction rejected".to_string(),
            ));
        }
        state.submitted.push(signed.to_string());
        let n = Self::next_id(&mut state);
        Ok(SubmissionRef {
            signature: format!("sig-{n:04}"),
        })
    }

    async fn gather_proofs(
        &self,
        collection_mint: &Address,
        bidder: &Address,
    ) -> Result<Vec<Proof>> {
        let state = self.state.read().unwrap();
        Ok(state
            .proofs
            .get(&(collection_mint.clone(), bidder.clone()))
            .cloned()
            .unwrap_or_default())
    }

    async fn refund(&self, params: &RefundParams) -> Result<SubmissionRef> {
        let mut state = self.state.write().unwrap();
        if state.fail_on_refund {
            return Err(ChainError::Program("refund rejected".to_string()));
        }
        state.refunds.push(params.clone());
        let n = Self::next_id(&mut state);
        Ok(SubmissionRef {
            signature: format!("sig-{n:04}"),
        })
    }

    async fn withdraw(
        &self,
        auction: &Address,
        _authority: &Address,
        _collection_mint: &Address,
        _creators: &[Creator],
        _token_mint: &Address,
    ) -> Result<SubmissionRef> {
        let mut state = self.state.write().unwrap();
        if state.fail_on_withdraw {
            return Err(ChainError::Program("withdraw rejected".to_string()));
        }
        state.withdrawals.push(auction.clone());
        let n = Self::next_id(&mut state);
        Ok(SubmissionRef {
            signature: format!("sig-{n:04}"),
        })
    }
}

/// In-memory credential verifier for testing.
///
/// Holds explicit token → principal grants; anything else is invalid.
#[derive(Debug, Clone, Default)]
pub struct FakeVerifier {
    grants: Arc<RwLock<HashMap<String, Address>>>,
}

impl FakeVerifier {
    /// Creates a verifier with no grants.
    pub fn new() -> Self {
        Self::default()
    }

    /// Grants a token the right to act as a principal.
    pub fn grant(&self, token: impl Into<String>, principal: Address) {
        self.grants.write().unwrap().insert(token.into(), principal);
    }
}

#[async_trait]
impl CredentialVerifier for FakeVerifier {
    async fn verify(&self, token: &str, expected_principal: &Address) -> CredentialCheck {
        match self.grants.read().unwrap().get(token) {
            Some(principal) if principal == expected_principal => CredentialCheck::valid(),
            Some(_) => CredentialCheck::invalid("credential does not match request principal"),
            None => CredentialCheck::invalid("invalid credential"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fetch_distinguishes_absence_from_fault() {
        let chain = FakeChain::new();
        let auction = Address::from("auction-1");

        // Unknown resource: definitive absence.
        assert!(chain.auction_snapshot(&auction).await.unwrap().is_none());

        // Scripted fault: transient error.
        chain.fail_next_fetches(1);
        assert!(chain.auction_snapshot(&auction).await.is_err());

        // Fault consumed, back to absence.
        assert!(chain.auction_snapshot(&auction).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn initialize_makes_auction_fetchable() {
        let chain = FakeChain::new();
        let params = InitializeAuctionParams {
            auction_address: Address::from("auction-1"),
            owner: Address::from("owner-1"),
            collection_mint: Address::from("collection-1"),
            merkle_tree: Address::from("tree-1"),
            base_price: 100,
            price_increment: 10,
            max_supply: 50,
            minimum_items: 5,
            deadline: 1_700_000_000,
            token_mint: Address::from("mint-1"),
        };

        chain.initialize_auction(&params).await.unwrap();

        let snap = chain
            .auction_snapshot(&params.auction_address)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(snap.token_mint, params.token_mint);
        assert_eq!(snap.max_supply, 50);
    }

    #[tokio::test]
    async fn gather_proofs_defaults_to_empty() {
        let chain = FakeChain::new();
        let proofs = chain
            .gather_proofs(&Address::from("collection-1"), &Address::from("bidder-1"))
            .await
            .unwrap();
        assert!(proofs.is_empty());
    }

    #[tokio::test]
    async fn verifier_checks_token_and_principal() {
        let verifier = FakeVerifier::new();
        let owner = Address::from("owner-1");
        verifier.grant("tok-1", owner.clone());

        assert!(verifier.verify("tok-1", &owner).await.valid);

        let other = verifier.verify("tok-1", &Address::from("owner-2")).await;
        assert!(!other.valid);
        assert!(other.message.unwrap().contains("does not match"));

        let unknown = verifier.verify("tok-9", &owner).await;
        assert!(!unknown.valid);
    }
}
