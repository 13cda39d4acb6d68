//! Integration tests for the chain store: height ordering, commit
//! atomicity, snapshot layering and the export view.

use sandbox_core::{
    Address, Block, Collection, Delta, Event, Identifier, RegisterKey, TransactionBody,
    TransactionResult,
};
use sandbox_store::{ChainStore, Error, SnapshotTree};

fn register(name: &str) -> RegisterKey {
    RegisterKey::new(Address::SERVICE, name)
}

fn delta_with(name: &str, value: &[u8]) -> Delta {
    let mut delta = Delta::new();
    delta.set(register(name), value.to_vec());
    delta
}

/// Commits an empty block at the next height, carrying the given delta
/// and events.
fn commit_next(store: &ChainStore, delta: Delta, events: Vec<Event>) -> Block {
    let (height, parent_id) = match store.latest_block() {
        Ok(parent) => (parent.height + 1, parent.id()),
        Err(_) => (0, Identifier::ZERO),
    };
    let block = Block::new(height, parent_id, height * 1000, vec![]);
    store
        .commit_block(block.clone(), vec![], vec![], vec![], delta, events)
        .expect("commit should succeed");
    block
}

#[test]
fn height_monotonicity() {
    let store = ChainStore::new();
    for expected in 0u64..8 {
        commit_next(&store, Delta::new(), vec![]);
        assert_eq!(store.latest_height().expect("height"), expected);
    }
}

#[test]
fn commit_is_atomic_on_mismatched_results() {
    let store = ChainStore::new();
    commit_next(&store, Delta::new(), vec![]);

    let tx_a = TransactionBody::new("a", vec![], vec![Address::SERVICE], "a.cdc");
    let tx_b = TransactionBody::new("b", vec![], vec![Address::SERVICE], "b.cdc");
    let result_a = TransactionResult::succeeded(tx_a.id(), vec![]);
    let collection = Collection::new(vec![tx_a.id(), tx_b.id()]);
    let collection_id = collection.id();
    let block = Block::new(1, store.latest_block().expect("block").id(), 0, vec![collection_id]);
    let block_id = block.id();

    // Two transactions, one result: the whole commit must be rejected.
    let err = store
        .commit_block(
            block,
            vec![collection],
            vec![tx_a.clone(), tx_b.clone()],
            vec![result_a],
            delta_with("counter", b"1"),
            vec![Event::new("sandbox.X", vec![], 1, 0)],
        )
        .unwrap_err();
    assert!(matches!(err, Error::InconsistentCommit(_)));

    // Nothing referenced by the failed commit is observable.
    assert_eq!(store.latest_height().expect("height"), 0);
    assert_eq!(store.block_by_id(&block_id), Err(Error::NotFound));
    assert_eq!(store.collection_by_id(&collection_id), Err(Error::NotFound));
    assert_eq!(store.transaction_by_id(&tx_a.id()), Err(Error::NotFound));
    assert_eq!(store.transaction_by_id(&tx_b.id()), Err(Error::NotFound));
    assert_eq!(
        store.transaction_result_by_id(&tx_a.id()),
        Err(Error::NotFound)
    );
    assert!(store.events_by_height(1, "").is_empty());
    assert!(store.ledger_view(1).get(&register("counter")).is_none());
}

#[test]
fn commit_rejects_duplicate_transactions_masking_an_orphan_result() {
    let store = ChainStore::new();
    let tx = TransactionBody::new("dup", vec![], vec![Address::SERVICE], "dup.cdc");
    let stray_id = Identifier::hash_of(b"no such transaction");
    let results = vec![
        TransactionResult::succeeded(tx.id(), vec![]),
        TransactionResult::succeeded(stray_id, vec![]),
    ];
    let collection = Collection::new(vec![tx.id(), tx.id()]);
    let block = Block::new(0, Identifier::ZERO, 0, vec![collection.id()]);

    // Counts match and result ids are unique, but the duplicated body
    // hides that the second result pairs with nothing.
    let err = store
        .commit_block(
            block,
            vec![collection],
            vec![tx.clone(), tx.clone()],
            results,
            Delta::new(),
            vec![],
        )
        .unwrap_err();
    assert!(matches!(err, Error::InconsistentCommit(_)));

    assert_eq!(store.latest_height(), Err(Error::NotFound));
    assert_eq!(store.transaction_by_id(&tx.id()), Err(Error::NotFound));
    assert_eq!(
        store.transaction_result_by_id(&stray_id),
        Err(Error::NotFound),
        "a result without a transaction body must never be stored"
    );
}

#[test]
fn snapshots_are_immutable_across_appends() {
    let tree: SnapshotTree = SnapshotTree::empty().append(delta_with("k", b"before"));
    let reads_before = tree.get(&register("k")).map(<[u8]>::to_vec);

    let _newer = tree.append(delta_with("k", b"after"));

    assert_eq!(
        tree.get(&register("k")).map(<[u8]>::to_vec),
        reads_before,
        "a previously obtained snapshot must answer reads exactly as before"
    );
}

#[test]
fn layered_reads_observe_the_latest_write_at_or_before_height() {
    let store = ChainStore::new();
    for height in 0u64..8 {
        let delta = match height {
            3 => delta_with("k", b"v3"),
            7 => delta_with("k", b"v7"),
            _ => Delta::new(),
        };
        commit_next(&store, delta, vec![]);
    }

    assert_eq!(store.ledger_view(5).get(&register("k")), Some(b"v3".as_slice()));
    assert_eq!(store.ledger_view(7).get(&register("k")), Some(b"v7".as_slice()));
    assert_eq!(store.ledger_view(2).get(&register("k")), None);
}

#[test]
fn event_filtering_preserves_emission_order() {
    let store = ChainStore::new();
    for _ in 0..4 {
        commit_next(&store, Delta::new(), vec![]);
    }
    commit_next(
        &store,
        Delta::new(),
        vec![
            Event::new("x", b"A".to_vec(), 4, 0),
            Event::new("y", b"B".to_vec(), 4, 1),
            Event::new("x", b"C".to_vec(), 4, 2),
        ],
    );

    let filtered = store.events_by_height(4, "x");
    assert_eq!(filtered.len(), 2);
    assert_eq!(filtered[0].payload, b"A");
    assert_eq!(filtered[1].payload, b"C");

    let all = store.events_by_height(4, "");
    assert_eq!(all.len(), 3);
    assert_eq!(all[1].payload, b"B");

    assert!(store.events_by_height(5, "x").is_empty());
}

#[test]
fn export_round_trip_matches_direct_queries() {
    let store = ChainStore::new();
    let tx = TransactionBody::new("set", vec![], vec![Address::SERVICE], "set.cdc");
    let result = TransactionResult::succeeded(tx.id(), vec![0]);
    let collection = Collection::new(vec![tx.id()]);
    let block = Block::new(0, Identifier::ZERO, 0, vec![collection.id()]);
    store
        .commit_block(
            block,
            vec![collection],
            vec![tx.clone()],
            vec![result],
            delta_with("k", b"v"),
            vec![Event::new("sandbox.Set", vec![], 0, 0)],
        )
        .expect("commit");
    commit_next(&store, Delta::new(), vec![Event::new("sandbox.Tick", vec![], 1, 0)]);

    let json = store.export().to_json().expect("serialize");
    let snapshot: sandbox_store::StoreSnapshot =
        serde_json::from_slice(&json).expect("deserialize");

    assert_eq!(snapshot.block_height, store.latest_height().expect("height"));
    let mut exported_heights: Vec<u64> = snapshot.blocks.keys().copied().collect();
    exported_heights.sort_unstable();
    assert_eq!(exported_heights, vec![0, 1]);
    assert!(snapshot.transactions.contains_key(&tx.id()));
    assert!(snapshot.transaction_results.contains_key(&tx.id()));
    for height in [0u64, 1] {
        assert_eq!(
            snapshot.events_by_block_height[&height].len(),
            store.events_by_height(height, "").len()
        );
    }
}

#[test]
fn end_to_end_first_block() {
    let store = ChainStore::new();
    let tx = TransactionBody::new("hello", vec![], vec![Address::SERVICE], "hello.cdc");
    let result = TransactionResult::succeeded(tx.id(), vec![0, 1]);
    let collection = Collection::new(vec![tx.id()]);
    let block = Block::new(0, Identifier::ZERO, 123, vec![collection.id()]);
    let events = vec![
        Event::new("sandbox.First", vec![], 0, 0),
        Event::new("sandbox.Second", vec![], 0, 1),
    ];

    store
        .commit_block(
            block.clone(),
            vec![collection],
            vec![tx.clone()],
            vec![result.clone()],
            Delta::new(),
            events,
        )
        .expect("commit");

    assert_eq!(store.latest_block().expect("latest"), block);
    let stored_result = store
        .transaction_result_by_id(&tx.id())
        .expect("result lookup");
    assert!(stored_result.is_succeeded());
    assert_eq!(stored_result, result);

    let all_events = store.events_by_height(0, "");
    assert_eq!(all_events.len(), 2);
    assert_eq!(all_events[0].event_type, "sandbox.First");
    assert_eq!(all_events[1].event_type, "sandbox.Second");
}

#[test]
fn concurrent_readers_never_observe_partial_commits() {
    use std::sync::Arc;
    use std::thread;

    let store = Arc::new(ChainStore::new());
    let reader_store = store.clone();

    let reader = thread::spawn(move || {
        // Whenever a block is visible, its collection and transaction
        // must be visible too.
        for _ in 0..2000 {
            if let Ok(block) = reader_store.latest_block() {
                for collection_id in &block.collection_ids {
                    let collection = reader_store
                        .collection_by_id(collection_id)
                        .expect("collection visible with its block");
                    for transaction_id in &collection.transaction_ids {
                        reader_store
                            .transaction_by_id(transaction_id)
                            .expect("transaction visible with its collection");
                        reader_store
                            .transaction_result_by_id(transaction_id)
                            .expect("result visible with its transaction");
                    }
                }
            }
        }
    });

    for height in 0u64..50 {
        let tx = TransactionBody::new(
            format!("tx-{height}"),
            vec![],
            vec![Address::SERVICE],
            "loop.cdc",
        );
        let result = TransactionResult::succeeded(tx.id(), vec![]);
        let collection = Collection::new(vec![tx.id()]);
        let parent_id = store.latest_block().map(|b| b.id()).unwrap_or_default();
        let block = Block::new(height, parent_id, height, vec![collection.id()]);
        store
            .commit_block(block, vec![collection], vec![tx], vec![result], Delta::new(), vec![])
            .expect("commit");
    }

    reader.join().expect("reader thread");
}
