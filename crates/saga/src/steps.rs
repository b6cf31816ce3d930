//! Saga type and step name constants.

/// Saga type: create an auction with its backing collection.
pub const CREATE_AUCTION: &str = "create-auction";
/// Saga type: co-signed bid placement.
pub const PLACE_BID: &str = "place-bid";
/// Saga type: refund a bidder's proven items.
pub const REFUND: &str = "refund";
/// Saga type: withdraw auction funds.
pub const WITHDRAW: &str = "withdraw";

/// Step name: verify the caller's bearer credential.
pub const STEP_VERIFY_CREDENTIAL: &str = "verify_credential";
/// Step name: mint the collection NFT.
pub const STEP_CREATE_COLLECTION: &str = "create_collection";
/// Step name: verify the collection on chain.
pub const STEP_VERIFY_COLLECTION: &str = "verify_collection";
/// Step name: hand collection authority to the auction program.
pub const STEP_UPDATE_AUTHORITY: &str = "update_authority";
/// Step name: initialize the auction account.
pub const STEP_INITIALIZE_AUCTION: &str = "initialize_auction";
/// Step name: build the unsigned bid transaction.
pub const STEP_PREPARE_ARTIFACT: &str = "prepare_artifact";
/// Step name: suspended, waiting for the external signer.
pub const STEP_AWAIT_SIGNATURE: &str = "await_signature";
/// Step name: submit the signed transaction.
pub const STEP_SUBMIT_ARTIFACT: &str = "submit_artifact";
/// Step name: wait for a resolved auction snapshot.
pub const STEP_AWAIT_AUCTION: &str = "await_auction";
/// Step name: collect the bidder's ownership proofs.
pub const STEP_GATHER_PROOFS: &str = "gather_proofs";
/// Step name: refund each proven item.
pub const STEP_REFUND_ITEMS: &str = "refund_items";
/// Step name: withdraw funds to authority and creators.
pub const STEP_WITHDRAW_FUNDS: &str = "withdraw_funds";
