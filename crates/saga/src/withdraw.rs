//! The withdraw saga.
//!
//! Resolves the auction and moves its locked funds to the authority and
//! creators in one chain call.

use chain::{ChainClient, CredentialVerifier};
use common::{Address, InstanceId};
use serde::{Deserialize, Serialize};
use state_store::{SagaRecord, StateStore};

use crate::context::Services;
use crate::create_auction::FailedOutput;
use crate::error::Result;
use crate::outcome::Disposition;
use crate::sources::auction_hub_key;
use crate::steps;

/// Request to withdraw an auction's funds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawInput {
    pub auction: Address,
    /// Must match the auction account's authority.
    pub authority: Address,
    /// Bearer credential for `authority`.
    pub token: String,
}

/// Terminal result of a withdraw run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawOutput {
    pub status: Disposition,
    pub message: String,
    pub signature: String,
}

impl WithdrawOutput {
    fn failed(message: impl Into<String>) -> Self {
        Self {
            status: Disposition::Failed,
            message: message.into(),
            signature: String::new(),
        }
    }
}

impl FailedOutput for WithdrawOutput {
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
    /// Runs the withdraw saga to completion.
    #[tracing::instrument(skip(self, input), fields(saga_type = steps::WITHDRAW, %instance_id))]
    pub async fn withdraw(
        &self,
        instance_id: InstanceId,
        input: WithdrawInput,
    ) -> Result<WithdrawOutput> {
        metrics::counter!("saga_executions_total").increment(1);
        let started = std::time::Instant::now();
        let mut record = SagaRecord::new(instance_id, steps::WITHDRAW);

        record.begin_step(steps::STEP_VERIFY_CREDENTIAL);
        self.commit(&record).await?;
        if let Some(reason) = self.credential_gate(&input.token, &input.authority).await {
            tracing::error!(%reason, "credential verification failed");
            return self
                .finish_failed(&mut record, started, WithdrawOutput::failed(reason))
                .await;
        }

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
                        WithdrawOutput::failed("auction could not be resolved"),
                    )
                    .await;
            }
        };

        tracing::info!(step = steps::STEP_WITHDRAW_FUNDS, "saga step started");
        record.begin_step(steps::STEP_WITHDRAW_FUNDS);
        self.commit(&record).await?;
        let submitted = match self
            .chain()
            .withdraw(
                &auction.address,
                &input.authority,
                &auction.collection_mint,
                &auction.creators,
                &auction.token_mint,
            )
            .await
        {
            Ok(submitted) => {
                record.record_output(steps::STEP_WITHDRAW_FUNDS, &submitted)?;
                self.commit(&record).await?;
                submitted
            }
            Err(err) => {
                tracing::error!(error = %err, "withdrawal failed");
                return self
                    .finish_failed(&mut record, started, WithdrawOutput::failed(err.to_string()))
                    .await;
            }
        };

        record.succeed();
        self.commit(&record).await?;

        self.auction_monitors()
            .refresh(&auction_hub_key(&input.auction))
            .await;

        let duration = started.elapsed().as_secs_f64();
        metrics::histogram!("saga_duration_seconds").record(duration);
        metrics::counter!("saga_completed").increment(1);
        tracing::info!(duration, "withdraw saga completed");

        Ok(WithdrawOutput {
            status: Disposition::Success,
            message: "funds withdrawn".to_string(),
            signature: submitted.signature,
        })
    }
}
