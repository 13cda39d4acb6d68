//! End-to-end chain scenarios: deploy, execute, read back.

use sandbox_chain::{Blockchain, ContractDescriptor};
use sandbox_config::ChainConfig;
use sandbox_core::{Address, RegisterKey, TransactionBody};

fn transaction(script: &str) -> TransactionBody {
    TransactionBody::new(script, vec![], vec![Address::SERVICE], "test.cdc")
}

#[tokio::test]
async fn deploy_then_mutate_then_read() {
    let chain = Blockchain::new(ChainConfig::default()).expect("chain starts");

    chain
        .deploy(vec![ContractDescriptor {
            name: "Counter".to_string(),
            source: b"contract Counter {}".to_vec(),
            location: "contracts/counter.cdc".to_string(),
        }])
        .await
        .expect("deploy");

    let result = chain
        .execute_transaction(transaction(
            r#"{"writes": {"count": "1"}, "events": [{"type": "Counter.Incremented", "payload": "1"}]}"#,
        ))
        .await
        .expect("transaction");
    assert!(result.is_succeeded());
    assert_eq!(result.event_indices, vec![0]);

    let read = chain
        .execute_script(r#"{"read": "count"}"#, &[])
        .await
        .expect("script");
    assert_eq!(read.value, serde_json::json!("1"));

    // Deploy at height 1, transaction at height 2.
    let height = chain.store().latest_height().expect("height");
    assert_eq!(height, 2);
    let events = chain.store().events_by_height(2, "Counter.Incremented");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].payload, b"1");
}

#[tokio::test]
async fn older_views_survive_later_commits() {
    let chain = Blockchain::new(ChainConfig::default()).expect("chain starts");
    let key = RegisterKey::new(Address::SERVICE, "value");

    chain
        .execute_transaction(transaction(r#"{"writes": {"value": "old"}}"#))
        .await
        .expect("first write");
    let old_view = chain.store().ledger_view(1);

    chain
        .execute_transaction(transaction(r#"{"writes": {"value": "new"}}"#))
        .await
        .expect("second write");

    assert_eq!(old_view.get(&key), Some(b"old".as_slice()));
    assert_eq!(
        chain.store().ledger_view(2).get(&key),
        Some(b"new".as_slice())
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_transactions_commit_at_consecutive_heights() {
    use std::sync::Arc;

    let chain = Arc::new(Blockchain::new(ChainConfig::default()).expect("chain starts"));

    let mut handles = Vec::new();
    for i in 0..16 {
        let chain = chain.clone();
        handles.push(tokio::spawn(async move {
            chain
                .execute_transaction(transaction(&format!(r#"{{"writes": {{"k{i}": "v"}}}}"#)))
                .await
        }));
    }

    // Every concurrent request must land; a height conflict surfacing
    // as an error would mean two commits raced on the same parent.
    for handle in handles {
        let result = handle.await.expect("join").expect("transaction commits");
        assert!(result.is_succeeded());
    }
    assert_eq!(chain.store().latest_height().expect("height"), 16);
    for height in 1..=16 {
        let block = chain.store().block_by_height(height).expect("dense heights");
        let parent = chain.store().block_by_height(height - 1).expect("parent");
        assert_eq!(block.parent_id, parent.id());
    }
}

#[tokio::test]
async fn export_reflects_chain_history() {
    let chain = Blockchain::new(ChainConfig::default()).expect("chain starts");
    let body = transaction(r#"{"writes": {"k": "v"}}"#);
    chain
        .execute_transaction(body.clone())
        .await
        .expect("transaction");

    let snapshot = chain.export_state();
    assert_eq!(snapshot.block_height, 1);
    assert!(snapshot.transactions.contains_key(&body.id()));
    assert!(snapshot.transaction_results.contains_key(&body.id()));
    // Genesis events are present at height 0.
    assert!(!snapshot.events_by_block_height[&0].is_empty());
}
