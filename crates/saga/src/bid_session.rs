//! The co-signed bid placement session.
//!
//! A bid transaction is built here but signed elsewhere: the session
//! prepares the unsigned artifact, publishes it for the external signer to
//! read, suspends until exactly one signed transaction comes back, then
//! submits it. The signer talks to the session through [`BidSessionHandle`];
//! the first signature wins and every later one is rejected.

use std::sync::{Arc, Mutex};

use chain::{ChainClient, CredentialVerifier, UnsignedArtifact};
use common::{Address, InstanceId};
use serde::{Deserialize, Serialize};
use state_store::{SagaRecord, StateStore};
use tokio::sync::{oneshot, watch};

use crate::context::Services;
use crate::create_auction::FailedOutput;
use crate::error::Result;
use crate::outcome::Disposition;
use crate::sources::{auction_hub_key, bid_hub_key};
use crate::steps;

/// Request to place a bid on an auction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceBidInput {
    pub auction: Address,
    pub bidder: Address,
    /// Bid amount in the auction's payment token base units.
    pub amount: u64,
}

/// Terminal result of a bid placement run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceBidOutput {
    pub status: Disposition,
    pub message: String,
    pub signature: String,
}

impl PlaceBidOutput {
    fn failed(message: impl Into<String>) -> Self {
        Self {
            status: Disposition::Failed,
            message: message.into(),
            signature: String::new(),
        }
    }
}

impl FailedOutput for PlaceBidOutput {
    fn failure_message(&self) -> String {
        self.message.clone()
    }
}

/// Whether a submitted signature was taken by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureAck {
    /// The session took this signature and will submit it.
    Accepted,
    /// A signature was already taken, or the session has ended.
    Rejected,
}

/// The external signer's view of a running bid session.
///
/// Cheap to clone; every clone shares the single signature slot, so
/// first-writer-wins holds across clones.
pub struct BidSessionHandle {
    unsigned: watch::Receiver<Option<UnsignedArtifact>>,
    slot: Arc<Mutex<Option<oneshot::Sender<String>>>>,
}

impl Clone for BidSessionHandle {
    fn clone(&self) -> Self {
        Self {
            unsigned: self.unsigned.clone(),
            slot: Arc::clone(&self.slot),
        }
    }
}

impl BidSessionHandle {
    /// Waits for the unsigned transaction to be published and returns it.
    /// `None` means the session ended before producing one.
    pub async fn unsigned_artifact(&self) -> Option<UnsignedArtifact> {
        let mut unsigned = self.unsigned.clone();
        match unsigned.wait_for(|artifact| artifact.is_some()).await {
            Ok(artifact) => artifact.clone(),
            Err(_) => None,
        }
    }

    /// The unsigned transaction if it has already been published.
    pub fn unsigned_artifact_now(&self) -> Option<UnsignedArtifact> {
        self.unsigned.borrow().clone()
    }

    /// Hands a signed transaction to the session. Only the first caller is
    /// accepted; the slot empties atomically with the take, so two racing
    /// signers cannot both win.
    pub fn submit_signature(&self, signed: impl Into<String>) -> SignatureAck {
        let sender = match self.slot.lock() {
            Ok(mut slot) => slot.take(),
            Err(_) => None,
        };
        match sender {
            Some(sender) => match sender.send(signed.into()) {
                Ok(()) => SignatureAck::Accepted,
                // The session ended between the take and the send.
                Err(_) => SignatureAck::Rejected,
            },
            None => SignatureAck::Rejected,
        }
    }
}

/// One run of the place-bid saga, suspended mid-flight on an external
/// signer.
pub struct BidSession<C, V, St> {
    services: Services<C, V, St>,
    instance_id: InstanceId,
    input: PlaceBidInput,
    publish: watch::Sender<Option<UnsignedArtifact>>,
    signature: oneshot::Receiver<String>,
}

impl<C, V, St> BidSession<C, V, St>
where
    C: ChainClient,
    V: CredentialVerifier,
    St: StateStore,
{
    /// Creates a session and the handle the external signer drives it with.
    pub fn new(
        services: Services<C, V, St>,
        instance_id: InstanceId,
        input: PlaceBidInput,
    ) -> (Self, BidSessionHandle) {
        let (publish, unsigned) = watch::channel(None);
        let (sender, signature) = oneshot::channel();
        let handle = BidSessionHandle {
            unsigned,
            slot: Arc::new(Mutex::new(Some(sender))),
        };
        let session = Self {
            services,
            instance_id,
            input,
            publish,
            signature,
        };
        (session, handle)
    }

    /// Runs the session to completion.
    #[tracing::instrument(
        skip(self),
        fields(saga_type = steps::PLACE_BID, instance_id = %self.instance_id)
    )]
    pub async fn run(self) -> Result<PlaceBidOutput> {
        metrics::counter!("saga_executions_total").increment(1);
        let started = std::time::Instant::now();
        let services = self.services;
        let input = self.input;
        let mut record = SagaRecord::new(self.instance_id, steps::PLACE_BID);

        tracing::info!(step = steps::STEP_PREPARE_ARTIFACT, "saga step started");
        record.begin_step(steps::STEP_PREPARE_ARTIFACT);
        services.commit(&record).await?;
        let artifact = match services
            .chain()
            .prepare_bid_artifact(&input.auction, &input.bidder, input.amount)
            .await
        {
            Ok(artifact) => {
                record.record_output(steps::STEP_PREPARE_ARTIFACT, &artifact)?;
                services.commit(&record).await?;
                artifact
            }
            Err(err) => {
                tracing::error!(error = %err, "bid preparation failed");
                return services
                    .finish_failed(&mut record, started, PlaceBidOutput::failed(err.to_string()))
                    .await;
            }
        };

        // Publish for the signer, then suspend until the signature arrives.
        // send() only errors with no receiver alive, and we hold one in the
        // handle's watch; a dropped handle is caught by the recv below.
        let _ = self.publish.send(Some(artifact));
        tracing::info!(step = steps::STEP_AWAIT_SIGNATURE, "saga step started");
        record.begin_step(steps::STEP_AWAIT_SIGNATURE);
        services.commit(&record).await?;
        let signed = match services.config().signature_wait {
            Some(wait) => match tokio::time::timeout(wait, self.signature).await {
                Ok(received) => received,
                Err(_) => {
                    tracing::error!("signer did not respond in time");
                    return services
                        .finish_failed(
                            &mut record,
                            started,
                            PlaceBidOutput::failed("signer did not respond in time"),
                        )
                        .await;
                }
            },
            None => self.signature.await,
        };
        let signed = match signed {
            Ok(signed) => signed,
            // Every handle was dropped with the slot still full.
            Err(_) => {
                tracing::error!("signing session closed without a signature");
                return services
                    .finish_failed(
                        &mut record,
                        started,
                        PlaceBidOutput::failed("signing session closed without a signature"),
                    )
                    .await;
            }
        };

        tracing::info!(step = steps::STEP_SUBMIT_ARTIFACT, "saga step started");
        record.begin_step(steps::STEP_SUBMIT_ARTIFACT);
        services.commit(&record).await?;
        let submitted = match services.chain().submit_signed_artifact(&signed).await {
            Ok(submitted) => {
                record.record_output(steps::STEP_SUBMIT_ARTIFACT, &submitted)?;
                services.commit(&record).await?;
                submitted
            }
            Err(err) => {
                tracing::error!(error = %err, "bid submission failed");
                return services
                    .finish_failed(&mut record, started, PlaceBidOutput::failed(err.to_string()))
                    .await;
            }
        };

        record.succeed();
        services.commit(&record).await?;

        // Nudge the monitors so watchers see the new bid without waiting a
        // full cycle.
        services
            .auction_monitors()
            .refresh(&auction_hub_key(&input.auction))
            .await;
        services
            .bid_monitors()
            .refresh(&bid_hub_key(&input.auction, &input.bidder))
            .await;

        let duration = started.elapsed().as_secs_f64();
        metrics::histogram!("saga_duration_seconds").record(duration);
        metrics::counter!("saga_completed").increment(1);
        tracing::info!(duration, "place-bid saga completed");

        Ok(PlaceBidOutput {
            status: Disposition::Success,
            message: "bid placed".to_string(),
            signature: submitted.signature,
        })
    }
}
