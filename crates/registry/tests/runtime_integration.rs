//! Runtime facade driven end to end against the in-memory fakes.

use std::sync::Arc;
use std::time::Duration;

use chain::{AuctionFilter, AuctionSnapshot, FakeChain, FakeVerifier, TokenMetadata};
use common::{Address, InstanceId};
use registry::{Config, RegistryError, Runtime, StatusReport};
use saga::SignatureAck;
use state_store::{InMemoryStateStore, SagaStatus};

type TestRuntime = Runtime<FakeChain, FakeVerifier, InMemoryStateStore>;

struct Harness {
    chain: Arc<FakeChain>,
    verifier: Arc<FakeVerifier>,
    runtime: TestRuntime,
}

fn harness() -> Harness {
    let chain = Arc::new(FakeChain::new());
    let verifier = Arc::new(FakeVerifier::new());
    let store = Arc::new(InMemoryStateStore::new());
    // Long monitor timers; tests drive refreshes explicitly.
    let config = Config {
        refresh_interval: Duration::from_secs(600),
        snapshot_wait: Duration::from_secs(5),
        idle_timeout: Duration::from_secs(600),
        signature_wait: None,
        log_level: "info".to_string(),
    };
    let runtime = Runtime::new(Arc::clone(&chain), Arc::clone(&verifier), store, &config);
    Harness {
        chain,
        verifier,
        runtime,
    }
}

async fn wait_terminal(runtime: &TestRuntime, instance_id: InstanceId) -> StatusReport {
    for _ in 0..500 {
        if let Ok(report) = runtime.status(instance_id).await {
            if report.status.is_terminal() {
                return report;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("saga did not reach a terminal state");
}

fn resolved_auction() -> AuctionSnapshot {
    AuctionSnapshot {
        address: Address::from("auction-1"),
        authority: Address::from("owner-1"),
        collection_mint: Address::from("collection-1"),
        merkle_tree: Address::from("tree-1"),
        token_mint: Address::from("mint-1"),
        base_price: 100,
        price_increment: 10,
        max_supply: 50,
        minimum_items: 5,
        deadline: 1_900_000_000,
        ..Default::default()
    }
}

#[tokio::test]
async fn start_create_auction_by_name_and_query_status() {
    let h = harness();
    h.verifier.grant("tok-owner", Address::from("owner-1"));

    let input = serde_json::json!({
        "name": "Genesis",
        "description": "First drop",
        "image_url": "https://img.example/genesis.png",
        "owner": "owner-1",
        "creators": [{"address": "owner-1", "verified": false, "share": 100}],
        "base_price": 100,
        "price_increment": 10,
        "max_supply": 50,
        "minimum_items": 5,
        "deadline": 1_900_000_000,
        "token_mint": "mint-1",
        "token": "tok-owner",
    });
    let instance_id = h.runtime.start("create-auction", input).unwrap();

    let report = wait_terminal(&h.runtime, instance_id).await;
    assert_eq!(report.status, SagaStatus::Succeeded);
    assert_eq!(report.saga_type, "create-auction");
    assert_eq!(report.status_line, "succeeded");
    assert_eq!(h.chain.initialize_count(), 1);
}

#[tokio::test]
async fn start_rejects_unknown_and_unstartable_operations() {
    let h = harness();

    match h.runtime.start("cancel-auction", serde_json::json!({})) {
        Err(RegistryError::UnknownOperation(name)) => assert_eq!(name, "cancel-auction"),
        other => panic!("expected UnknownOperation, got {other:?}"),
    }

    match h.runtime.start("monitor-auction", serde_json::json!({})) {
        Err(RegistryError::NotStartable(name)) => assert_eq!(name, "monitor-auction"),
        other => panic!("expected NotStartable, got {other:?}"),
    }
}

#[tokio::test]
async fn start_rejects_malformed_input() {
    let h = harness();
    let result = h
        .runtime
        .start("refund", serde_json::json!({"auction": 42}));
    assert!(matches!(result, Err(RegistryError::InvalidInput(_))));
}

#[tokio::test]
async fn status_of_unknown_instance_is_rejected() {
    let h = harness();
    let missing = InstanceId::new();
    assert!(matches!(
        h.runtime.status(missing).await,
        Err(RegistryError::UnknownInstance(id)) if id == missing
    ));
}

#[tokio::test]
async fn place_bid_session_is_addressable_until_it_ends() {
    let h = harness();

    let input = serde_json::json!({
        "auction": "auction-1",
        "bidder": "bidder-1",
        "amount": 150,
    });
    let instance_id = h.runtime.start("place-bid", input).unwrap();

    let artifact = h.runtime.unsigned_artifact(instance_id).await.unwrap();
    assert_eq!(artifact.transaction, "unsigned:auction-1:bidder-1:150");

    assert_eq!(
        h.runtime.submit_signed(instance_id, "signed:one").unwrap(),
        SignatureAck::Accepted
    );
    assert_eq!(
        h.runtime.submit_signed(instance_id, "signed:two").unwrap(),
        SignatureAck::Rejected
    );

    let report = wait_terminal(&h.runtime, instance_id).await;
    assert_eq!(report.status, SagaStatus::Succeeded);
    assert_eq!(h.chain.submitted(), vec!["signed:one".to_string()]);

    // The finished session leaves the directory; only the persisted record
    // remains addressable.
    for _ in 0..500 {
        if h.runtime.submit_signed(instance_id, "signed:late").is_err() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(matches!(
        h.runtime.submit_signed(instance_id, "signed:late"),
        Err(RegistryError::UnknownInstance(_))
    ));
    assert!(h.runtime.status(instance_id).await.is_ok());
}

#[tokio::test]
async fn refund_with_no_proofs_succeeds_through_the_facade() {
    let h = harness();
    h.verifier.grant("tok-bidder", Address::from("bidder-1"));
    h.chain.set_auction(resolved_auction());

    let input = serde_json::json!({
        "auction": "auction-1",
        "bidder": "bidder-1",
        "token": "tok-bidder",
    });
    let instance_id = h.runtime.start("refund", input).unwrap();

    let report = wait_terminal(&h.runtime, instance_id).await;
    assert_eq!(report.status, SagaStatus::Succeeded);
    assert_eq!(h.chain.refund_count(), 0);
}

#[tokio::test]
async fn failed_saga_reports_its_reason() {
    let h = harness();
    // No credential granted.
    let input = serde_json::json!({
        "auction": "auction-1",
        "authority": "owner-1",
        "token": "tok-unknown",
    });
    let instance_id = h.runtime.start("withdraw", input).unwrap();

    let report = wait_terminal(&h.runtime, instance_id).await;
    assert_eq!(report.status, SagaStatus::Failed);
    assert_eq!(report.status_line, "failed");
    assert_eq!(report.failure_message.as_deref(), Some("invalid credential"));
}

#[tokio::test]
async fn read_only_chain_queries_pass_through() {
    let h = harness();
    h.chain.set_auction(resolved_auction());

    let page = h
        .runtime
        .list_auctions(&AuctionFilter::default())
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.auctions[0].address, Address::from("auction-1"));

    let details = h
        .runtime
        .auction_details(&Address::from("auction-1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(details.token_mint, Address::from("mint-1"));

    assert!(h
        .runtime
        .auction_details(&Address::from("auction-9"))
        .await
        .unwrap()
        .is_none());

    // Nothing scripted yet: both allow-lists are empty, not errors.
    assert!(h.runtime.allowed_creators().await.unwrap().is_empty());
    assert!(h.runtime.accepted_token_mints().await.unwrap().is_empty());

    h.chain
        .set_allowed_creators(vec![Address::from("owner-1"), Address::from("owner-2")]);
    h.chain.set_accepted_token_mints(vec![TokenMetadata {
        mint: Address::from("mint-1"),
        name: "Auction Token".to_string(),
        symbol: "AUCT".to_string(),
        uri: "https://meta.example/auct.json".to_string(),
        decimals: 6,
    }]);

    let creators = h.runtime.allowed_creators().await.unwrap();
    assert_eq!(creators.len(), 2);
    assert_eq!(creators[0], Address::from("owner-1"));

    let mints = h.runtime.accepted_token_mints().await.unwrap();
    assert_eq!(mints.len(), 1);
    assert_eq!(mints[0].mint, Address::from("mint-1"));
    assert_eq!(mints[0].decimals, 6);
}

#[tokio::test]
async fn watch_auction_streams_snapshots_on_refresh() {
    let h = harness();
    h.chain.set_auction(resolved_auction());

    let mut deliveries = h.runtime.watch_auction(&Address::from("auction-1")).await;
    let first = deliveries.recv().await.unwrap();
    assert_eq!(first.address, Address::from("auction-1"));

    // A state change becomes visible on the next nudge.
    let mut updated = resolved_auction();
    updated.current_supply = 3;
    h.chain.set_auction(updated);
    assert!(h.runtime.refresh_auction(&Address::from("auction-1")).await);
    assert_eq!(deliveries.recv().await.unwrap().current_supply, 3);

    // No bid hub is live, so the nudge reports that.
    assert!(
        !h.runtime
            .refresh_bid(&Address::from("auction-1"), &Address::from("bidder-1"))
            .await
    );

    h.runtime.shutdown().await;
}
