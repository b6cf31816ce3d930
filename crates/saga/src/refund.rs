//! The refund saga.
//!
//! Resolves the auction, gathers the bidder's ownership proofs, and
//! refunds each proven item in order. The loop is fail-fast: a rejected
//! refund ends the run, keeping the signatures of the items already
//! refunded. A bidder with nothing to refund succeeds with no signatures.

use chain::{ChainClient, CredentialVerifier, RefundParams};
use common::{Address, InstanceId};
use serde::{Deserialize, Serialize};
use state_store::{SagaRecord, StateStore};

use crate::context::Services;
use crate::create_auction::FailedOutput;
use crate::error::Result;
use crate::outcome::Disposition;
use crate::sources::{auction_hub_key, bid_hub_key};
use crate::steps;

/// Request to refund a bidder's proven items on an auction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundInput {
    pub auction: Address,
    pub bidder: Address,
    /// Bearer credential for `bidder`.
    pub token: String,
}

/// Terminal result of a refund run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundOutput {
    pub status: Disposition,
    pub message: String,
    /// One signature per item refunded before the run ended, in order.
    pub signatures: Vec<String>,
}

impl RefundOutput {
    fn failed(message: impl Into<String>, signatures: Vec<String>) -> Self {
        Self {
            status: Disposition::Failed,
            message: message.into(),
            signatures,
        }
    }
}

impl FailedOutput for RefundOutput {
    fn failure_message(&self) -> String {
        self.message.clone()
    }
}

impl<C, V, St> Services<C, V, St>
where
    C: ChainClient,
    V: CredentialVerifier,
    St: StateStore,
{
    /// Runs the refund saga to completion.
    #[tracing::instrument(skip(self, input), fields(saga_type = steps::REFUND, %instance_id))]
    pub async fn refund(
        &self,
        instance_id: InstanceId,
        input: RefundInput,
    ) -> Result<RefundOutput> {
        metrics::counter!("saga_executions_total").increment(1);
        let started = std::time::Instant::now();
        let mut record = SagaRecord::new(instance_id, steps::REFUND);

        record.begin_step(steps::STEP_VERIFY_CREDENTIAL);
        self.commit(&record).await?;
        if let Some(reason) = self.credential_gate(&input.token, &input.bidder).await {
            tracing::error!(%reason, "credential verification failed");
            return self
                .finish_failed(&mut record, started, RefundOutput::failed(reason, vec![]))
                .await;
        }

        // Resolve the auction through its monitor hub; the refund needs its
        // collection, tree, and payment mint.
        tracing::info!(step = steps::STEP_AWAIT_AUCTION, "saga step started");
        record.begin_step(steps::STEP_AWAIT_AUCTION);
        self.commit(&record).await?;
        let auction = match self.await_auction_snapshot(instance_id, &input.auction).await {
            Some(auction) => auction,
            None => {
                tracing::error!(auction = %input.auction, "auction could not be resolved");
                return self
                    .finish_failed(
                        &mut record,
                        started,
                        RefundOutput::failed("auction could not be resolved", vec![]),
                    )
                    .await;
            }
        };

        tracing::info!(step = steps::STEP_GATHER_PROOFS, "saga step started");
        record.begin_step(steps::STEP_GATHER_PROOFS);
        self.commit(&record).await?;
        let proofs = match self
            .chain()
            .gather_proofs(&auction.collection_mint, &input.bidder)
            .await
        {
            Ok(proofs) => {
                record.record_output(steps::STEP_GATHER_PROOFS, &proofs.len())?;
                self.commit(&record).await?;
                proofs
            }
            Err(err) => {
                tracing::error!(error = %err, "proof gathering failed");
                return self
                    .finish_failed(
                        &mut record,
                        started,
                        RefundOutput::failed(err.to_string(), vec![]),
                    )
                    .await;
            }
        };

        tracing::info!(
            step = steps::STEP_REFUND_ITEMS,
            proofs = proofs.len(),
            "saga step started"
        );
        record.begin_step(steps::STEP_REFUND_ITEMS);
        self.commit(&record).await?;
        let mut signatures = Vec::with_capacity(proofs.len());
        for proof in proofs {
            let params = RefundParams {
                auction: input.auction.clone(),
                token_mint: auction.token_mint.clone(),
                bidder: input.bidder.clone(),
                merkle_tree: auction.merkle_tree.clone(),
                proof,
            };
            match self.chain().refund(&params).await {
                Ok(submitted) => signatures.push(submitted.signature),
                Err(err) => {
                    tracing::error!(
                        error = %err,
                        refunded = signatures.len(),
                        "item refund failed"
                    );
                    let output = RefundOutput::failed(err.to_string(), signatures);
                    return self.finish_failed(&mut record, started, output).await;
                }
            }
        }
        record.record_output(steps::STEP_REFUND_ITEMS, &signatures)?;

        record.succeed();
        self.commit(&record).await?;

        // Nudge the monitors so watchers see the refunded position without
        // waiting a full cycle. Absent hubs are fine.
        self.auction_monitors()
            .refresh(&auction_hub_key(&input.auction))
            .await;
        self.bid_monitors()
            .refresh(&bid_hub_key(&input.auction, &input.bidder))
            .await;

        let duration = started.elapsed().as_secs_f64();
        metrics::histogram!("saga_duration_seconds").record(duration);
        metrics::counter!("saga_completed").increment(1);
        tracing::info!(duration, refunded = signatures.len(), "refund saga completed");

        let message = if signatures.is_empty() {
            "no refundable items".to_string()
        } else {
            format!("refunded {} items", signatures.len())
        };
        Ok(RefundOutput {
            status: Disposition::Success,
            message,
            signatures,
        })
    }
}
