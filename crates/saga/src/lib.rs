//! Saga orchestration for auction operations.
//!
//! Each saga is a fixed sequence of chain activity steps with fail-fast
//! short-circuiting: the first failing step ends the run, the terminal
//! result carries the failing step's message plus whatever partial
//! identifiers earlier steps produced, and nothing is compensated or
//! rolled back — reconciliation is the caller's job.
//!
//! The sagas:
//! 1. `create_auction` — collection NFT → verify → authority → initialize.
//! 2. `place_bid` (a [`BidSession`]) — prepare an unsigned transaction,
//!    hand it to an external signer, submit the signed result.
//! 3. `refund` — await the auction's live snapshot, then refund every
//!    proven item of a bidder.
//! 4. `withdraw` — await the auction's live snapshot, then withdraw funds
//!    to authority and creators.
//!
//! Progress is committed to the state store at every transition, so status
//! queries never touch a running saga.

pub mod bid_session;
mod context;
pub mod create_auction;
mod error;
mod outcome;
pub mod refund;
pub mod sources;
pub mod steps;
pub mod withdraw;

pub use bid_session::{
    BidSession, BidSessionHandle, PlaceBidInput, PlaceBidOutput, SignatureAck,
};
pub use context::{SagaConfig, Services};
pub use create_auction::{CreateAuctionInput, CreateAuctionOutput};
pub use error::{Result, SagaError};
pub use outcome::Disposition;
pub use refund::{RefundInput, RefundOutput};
pub use withdraw::{WithdrawInput, WithdrawOutput};
