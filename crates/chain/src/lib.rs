//! The chain activity boundary.
//!
//! Everything the orchestration layer asks of the blockchain goes through
//! the [`ChainClient`] trait: single idempotent request/response calls with
//! no side channel. Transaction construction, signing and program semantics
//! live behind the trait; this crate only defines the contract and the
//! value objects that cross it, plus in-memory fakes for tests.

mod client;
mod credential;
mod error;
mod fake;
mod types;

pub use client::ChainClient;
pub use credential::{CredentialCheck, CredentialVerifier};
pub use error::{ChainError, Result};
pub use fake::{FakeChain, FakeVerifier};
pub use types::{
    AuctionFilter, AuctionPage, AuctionSnapshot, AuthorityUpdated, BidSnapshot, CollectionCreated,
    Creator, InitializeAuctionParams, Proof, RefundParams, SubmissionRef, TokenMetadata,
    UnsignedArtifact,
};
