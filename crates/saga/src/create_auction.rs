//! The create-auction saga.
//!
//! Credential gate, then four chain steps in order: mint the collection
//! NFT, verify it, hand its authority to the auction program (deriving the
//! auction PDA), initialize the auction account. The first failure ends the
//! run with the partial identifiers produced so far.

use chain::{ChainClient, CredentialVerifier, Creator, InitializeAuctionParams};
use common::{Address, InstanceId};
use serde::{Deserialize, Serialize};
use state_store::{SagaRecord, StateStore};

use crate::context::Services;
use crate::error::Result;
use crate::outcome::Disposition;
use crate::steps;

/// Request to create an auction and its backing collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAuctionInput {
    pub name: String,
    pub description: String,
    pub image_url: String,
    /// The principal the bearer credential must assert.
    pub owner: Address,
    pub creators: Vec<Creator>,
    pub base_price: u64,
    pub price_increment: u64,
    pub max_supply: u64,
    pub minimum_items: u64,
    /// Unix timestamp in seconds.
    pub deadline: i64,
    /// Payment token mint accepted by the auction.
    pub token_mint: Address,
    /// Bearer credential for `owner`.
    pub token: String,
}

/// Terminal result of a create-auction run.
///
/// On failure the identifier fields hold whatever earlier steps produced;
/// reconciliation of a half-created auction is the caller's responsibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAuctionOutput {
    pub status: Disposition,
    pub message: String,
    pub collection_mint: Address,
    pub collection_tx: String,
    pub auction_address: Address,
    pub auction_tx: String,
    pub merkle_tree: Address,
    pub token_mint: Address,
}

impl CreateAuctionOutput {
    fn failed(message: impl Into<String>) -> Self {
        Self {
            status: Disposition::Failed,
            message: message.into(),
            collection_mint: Address::empty(),
            collection_tx: String::new(),
            auction_address: Address::empty(),
            auction_tx: String::new(),
            merkle_tree: Address::empty(),
            token_mint: Address::empty(),
        }
    }
}

impl<C, V, St> Services<C, V, St>
where
    C: ChainClient,
    V: CredentialVerifier,
    St: StateStore,
{
    /// Runs the create-auction saga to completion.
    #[tracing::instrument(skip(self, input), fields(saga_type = steps::CREATE_AUCTION, %instance_id))]
    pub async fn create_auction(
        &self,
        instance_id: InstanceId,
        input: CreateAuctionInput,
    ) -> Result<CreateAuctionOutput> {
        metrics::counter!("saga_executions_total").increment(1);
        let started = std::time::Instant::now();
        let mut record = SagaRecord::new(instance_id, steps::CREATE_AUCTION);

        // Credential gate: nothing touches the chain before this passes.
        record.begin_step(steps::STEP_VERIFY_CREDENTIAL);
        self.commit(&record).await?;
        if let Some(reason) = self.credential_gate(&input.token, &input.owner).await {
            tracing::error!(%reason, "credential verification failed");
            return self
                .finish_failed(&mut record, started, CreateAuctionOutput::failed(reason))
                .await;
        }

        // Business-rule validation, still before any transaction.
        if input.minimum_items > input.max_supply {
            let reason = format!(
                "minimum_items {} exceeds max_supply {}",
                input.minimum_items, input.max_supply
            );
            tracing::error!(%reason, "auction parameters rejected");
            return self
                .finish_failed(&mut record, started, CreateAuctionOutput::failed(reason))
                .await;
        }

        // Step 1: mint the collection NFT.
        tracing::info!(step = steps::STEP_CREATE_COLLECTION, "saga step started");
        record.begin_step(steps::STEP_CREATE_COLLECTION);
        self.commit(&record).await?;
        let collection = match self
            .chain()
            .create_collection(
                &format!("{} Collection", input.name),
                &format!("Collection for {} auction", input.name),
                &input.owner,
                &input.creators,
            )
            .await
        {
            Ok(collection) => {
                record.record_output(steps::STEP_CREATE_COLLECTION, &collection)?;
                self.commit(&record).await?;
                collection
            }
            Err(err) => {
                tracing::error!(error = %err, "collection creation failed");
                return self
                    .finish_failed(
                        &mut record,
                        started,
                        CreateAuctionOutput::failed(err.to_string()),
                    )
                    .await;
            }
        };

        // Step 2: verify the collection.
        tracing::info!(step = steps::STEP_VERIFY_COLLECTION, "saga step started");
        record.begin_step(steps::STEP_VERIFY_COLLECTION);
        self.commit(&record).await?;
        match self
            .chain()
            .verify_collection(&collection.collection_mint)
            .await
        {
            Ok(verified) => {
                record.record_output(steps::STEP_VERIFY_COLLECTION, &verified)?;
                self.commit(&record).await?;
            }
            Err(err) => {
                tracing::error!(error = %err, "collection verification failed");
                let output = CreateAuctionOutput {
                    collection_mint: collection.collection_mint.clone(),
                    collection_tx: collection.tx_ref.clone(),
                    merkle_tree: collection.merkle_tree.clone(),
                    ..CreateAuctionOutput::failed(err.to_string())
                };
                return self.finish_failed(&mut record, started, output).await;
            }
        }

        // Step 3: hand authority to the auction program.
        tracing::info!(step = steps::STEP_UPDATE_AUTHORITY, "saga step started");
        record.begin_step(steps::STEP_UPDATE_AUTHORITY);
        self.commit(&record).await?;
        let authority = match self
            .chain()
            .update_collection_authority(
                &collection.collection_mint,
                &input.owner,
                &collection.merkle_tree,
            )
            .await
        {
            Ok(authority) => {
                record.record_output(steps::STEP_UPDATE_AUTHORITY, &authority)?;
                self.commit(&record).await?;
                authority
            }
            Err(err) => {
                tracing::error!(error = %err, "authority update failed");
                let output = CreateAuctionOutput {
                    collection_mint: collection.collection_mint.clone(),
                    collection_tx: collection.tx_ref.clone(),
                    merkle_tree: collection.merkle_tree.clone(),
                    ..CreateAuctionOutput::failed(err.to_string())
                };
                return self.finish_failed(&mut record, started, output).await;
            }
        };

        // Step 4: initialize the auction account.
        tracing::info!(step = steps::STEP_INITIALIZE_AUCTION, "saga step started");
        record.begin_step(steps::STEP_INITIALIZE_AUCTION);
        self.commit(&record).await?;
        let params = InitializeAuctionParams {
            auction_address: authority.auction_address.clone(),
            owner: input.owner.clone(),
            collection_mint: collection.collection_mint.clone(),
            merkle_tree: collection.merkle_tree.clone(),
            base_price: input.base_price,
            price_increment: input.price_increment,
            max_supply: input.max_supply,
            minimum_items: input.minimum_items,
            deadline: input.deadline,
            token_mint: input.token_mint.clone(),
        };
        let initialized = match self.chain().initialize_auction(&params).await {
            Ok(initialized) => {
                record.record_output(steps::STEP_INITIALIZE_AUCTION, &initialized)?;
                self.commit(&record).await?;
                initialized
            }
            Err(err) => {
                tracing::error!(error = %err, "auction initialization failed");
                let output = CreateAuctionOutput {
                    collection_mint: collection.collection_mint.clone(),
                    collection_tx: collection.tx_ref.clone(),
                    merkle_tree: collection.merkle_tree.clone(),
                    auction_address: authority.auction_address.clone(),
                    auction_tx: authority.tx_ref.clone(),
                    ..CreateAuctionOutput::failed(err.to_string())
                };
                return self.finish_failed(&mut record, started, output).await;
            }
        };

        record.succeed();
        self.commit(&record).await?;
        let duration = started.elapsed().as_secs_f64();
        metrics::histogram!("saga_duration_seconds").record(duration);
        metrics::counter!("saga_completed").increment(1);
        tracing::info!(duration, "create-auction saga completed");

        Ok(CreateAuctionOutput {
            status: Disposition::Success,
            message: "auction initialized".to_string(),
            collection_mint: collection.collection_mint,
            collection_tx: collection.tx_ref,
            auction_address: authority.auction_address,
            auction_tx: initialized.signature,
            merkle_tree: collection.merkle_tree,
            token_mint: input.token_mint,
        })
    }

    /// Commits the failed record and finishes the run's metrics.
    pub(crate) async fn finish_failed<T>(
        &self,
        record: &mut SagaRecord,
        started: std::time::Instant,
        output: T,
    ) -> Result<T>
    where
        T: FailedOutput,
    {
        record.fail(output.failure_message());
        self.commit(record).await?;
        metrics::histogram!("saga_duration_seconds").record(started.elapsed().as_secs_f64());
        metrics::counter!("saga_failed").increment(1);
        Ok(output)
    }
}

/// Outputs that can describe their failure for the saga record.
pub(crate) trait FailedOutput {
    fn failure_message(&self) -> String;
}

impl FailedOutput for CreateAuctionOutput {
    fn failure_message(&self) -> String {
        self.message.clone()
    }
}
