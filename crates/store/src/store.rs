//! The indexed chain store.
//!
//! One `ChainStore` holds the complete state of one sandboxed chain:
//! blocks indexed by height and by identifier, collections,
//! transactions and their results indexed by identifier, events
//! grouped by block height, and one [`SnapshotTree`] per committed
//! height. A single coarse read/write lock guards all of it, so a
//! commit is never partially visible to readers.

use crate::export::StoreSnapshot;
use crate::snapshot::SnapshotTree;
use crate::{Error, Result};
use parking_lot::RwLock;
use sandbox_core::{
    Block, Collection, Delta, Event, Identifier, TransactionBody, TransactionResult,
};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// The embedded chain-state store.
///
/// Created empty; mutated exclusively through [`ChainStore::commit_block`];
/// read concurrently by any number of queries.
#[derive(Debug, Default)]
pub struct ChainStore {
    inner: RwLock<StoreInner>,
}

#[derive(Debug, Default)]
struct StoreInner {
    block_id_to_height: HashMap<Identifier, u64>,
    blocks: HashMap<u64, Block>,
    collections: HashMap<Identifier, Collection>,
    transactions: HashMap<Identifier, TransactionBody>,
    transaction_results: HashMap<Identifier, TransactionResult>,
    ledger: HashMap<u64, SnapshotTree>,
    events_by_height: HashMap<u64, Vec<Event>>,
    latest_height: Option<u64>,
}

impl ChainStore {
    /// Creates an empty store: no blocks, no events, all ledger views
    /// empty.
    pub fn new() -> Self {
        Self::default()
    }

    /// The height of the latest committed block.
    ///
    /// Fails with [`Error::NotFound`] iff no block has ever been
    /// committed.
    pub fn latest_height(&self) -> Result<u64> {
        self.inner.read().latest_height.ok_or(Error::NotFound)
    }

    /// The latest committed block.
    pub fn latest_block(&self) -> Result<Block> {
        let inner = self.inner.read();
        let height = inner.latest_height.ok_or(Error::NotFound)?;
        inner.blocks.get(&height).cloned().ok_or(Error::NotFound)
    }

    /// Looks up a block by its identifier.
    pub fn block_by_id(&self, block_id: &Identifier) -> Result<Block> {
        let inner = self.inner.read();
        let height = inner
            .block_id_to_height
            .get(block_id)
            .ok_or(Error::NotFound)?;
        inner.blocks.get(height).cloned().ok_or(Error::NotFound)
    }

    /// Looks up a block by its height.
    pub fn block_by_height(&self, height: u64) -> Result<Block> {
        self.inner
            .read()
            .blocks
            .get(&height)
            .cloned()
            .ok_or(Error::NotFound)
    }

    /// Looks up a collection by its identifier.
    pub fn collection_by_id(&self, collection_id: &Identifier) -> Result<Collection> {
        self.inner
            .read()
            .collections
            .get(collection_id)
            .cloned()
            .ok_or(Error::NotFound)
    }

    /// Looks up a transaction body by its identifier.
    pub fn transaction_by_id(&self, transaction_id: &Identifier) -> Result<TransactionBody> {
        self.inner
            .read()
            .transactions
            .get(transaction_id)
            .cloned()
            .ok_or(Error::NotFound)
    }

    /// Looks up a transaction result by the transaction's identifier.
    pub fn transaction_result_by_id(
        &self,
        transaction_id: &Identifier,
    ) -> Result<TransactionResult> {
        self.inner
            .read()
            .transaction_results
            .get(transaction_id)
            .cloned()
            .ok_or(Error::NotFound)
    }

    /// Returns the ledger read view valid as of `height`.
    ///
    /// A height with no committed snapshot (including height 0 before
    /// the first commit) yields the empty view: all reads miss, no
    /// error.
    pub fn ledger_view(&self, height: u64) -> SnapshotTree {
        self.inner
            .read()
            .ledger
            .get(&height)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns the events emitted at `height`, in emission order.
    ///
    /// An empty `type_filter` selects all events at that height; a
    /// non-empty filter selects only events whose type tag equals it,
    /// relative order preserved. An unknown height yields an empty
    /// vector, not an error.
    pub fn events_by_height(&self, height: u64, type_filter: &str) -> Vec<Event> {
        let inner = self.inner.read();
        let Some(events) = inner.events_by_height.get(&height) else {
            return Vec::new();
        };
        events
            .iter()
            .filter(|event| type_filter.is_empty() || event.event_type == type_filter)
            .cloned()
            .collect()
    }

    /// Atomically commits a block with its collections, transactions,
    /// results, execution delta and events.
    ///
    /// Preconditions are validated before any index is touched; on
    /// failure the store is observably unmodified:
    /// - the block height is exactly `latest + 1` (0 for the first
    ///   commit)
    /// - every transaction has exactly one result with the same
    ///   identifier
    ///
    /// The snapshot for the committed height is the previous height's
    /// tree with `delta` layered on top. Events are appended to the
    /// height's event list, never replacing earlier entries, so one
    /// block may commit events in several steps.
    pub fn commit_block(
        &self,
        block: Block,
        collections: Vec<Collection>,
        transactions: Vec<TransactionBody>,
        results: Vec<TransactionResult>,
        delta: Delta,
        events: Vec<Event>,
    ) -> Result<()> {
        let mut inner = self.inner.write();

        // Height must land exactly on top of the chain as observed
        // under the exclusive lock.
        let expected_height = match inner.latest_height {
            Some(height) => height + 1,
            None => 0,
        };
        if block.height != expected_height {
            return Err(Error::InconsistentCommit(format!(
                "block height {} does not extend the chain (expected {})",
                block.height, expected_height
            )));
        }

        if transactions.len() != results.len() {
            return Err(Error::InconsistentCommit(format!(
                "transaction count ({}) does not match result count ({})",
                transactions.len(),
                results.len()
            )));
        }

        if transactions.len() > sandbox_config::MAX_TRANSACTIONS_PER_BLOCK {
            return Err(Error::InconsistentCommit(format!(
                "transaction count ({}) exceeds the per-block limit ({})",
                transactions.len(),
                sandbox_config::MAX_TRANSACTIONS_PER_BLOCK
            )));
        }

        // Bodies and results must pair off one to one: both id sets
        // duplicate-free, equal counts, and every result id backed by a
        // transaction. Together that makes the id sets identical, so no
        // orphan result can enter the store.
        let transaction_ids: HashSet<Identifier> = transactions
            .iter()
            .map(|transaction| transaction.id())
            .collect();
        if transaction_ids.len() != transactions.len() {
            return Err(Error::InconsistentCommit(
                "duplicate transaction identifiers".to_string(),
            ));
        }
        let result_ids: HashSet<Identifier> =
            results.iter().map(|result| result.transaction_id).collect();
        if result_ids.len() != results.len() {
            return Err(Error::InconsistentCommit(
                "duplicate transaction result identifiers".to_string(),
            ));
        }
        for result in &results {
            if !transaction_ids.contains(&result.transaction_id) {
                return Err(Error::InconsistentCommit(format!(
                    "result {} has no matching transaction",
                    result.transaction_id
                )));
            }
        }

        // All preconditions hold; apply every index update under the
        // same exclusive lock.
        let height = block.height;
        let block_id = block.id();

        inner.block_id_to_height.insert(block_id, height);
        inner.blocks.insert(height, block);
        inner.latest_height = Some(height);

        for collection in collections {
            inner.collections.insert(collection.id(), collection);
        }
        for transaction in transactions {
            inner.transactions.insert(transaction.id(), transaction);
        }
        for result in results {
            inner
                .transaction_results
                .insert(result.transaction_id, result);
        }

        let parent_tree = match height.checked_sub(1) {
            Some(parent) => inner.ledger.get(&parent).cloned().unwrap_or_default(),
            None => SnapshotTree::empty(),
        };
        inner.ledger.insert(height, parent_tree.append(delta));

        let event_count = events.len();
        inner
            .events_by_height
            .entry(height)
            .or_default()
            .extend(events);

        debug!(
            target: "sandbox::store",
            height,
            block_id = %block_id,
            events = event_count,
            "committed block"
        );

        Ok(())
    }

    /// Produces a point-in-time, read-consistent projection of the
    /// indexed maps for external inspection.
    ///
    /// Raw ledger registers are excluded; only the indices are
    /// exported.
    pub fn export(&self) -> StoreSnapshot {
        let inner = self.inner.read();
        StoreSnapshot {
            block_id_to_height: inner.block_id_to_height.clone(),
            blocks: inner.blocks.clone(),
            collections: inner.collections.clone(),
            transactions: inner.transactions.clone(),
            transaction_results: inner.transaction_results.clone(),
            events_by_block_height: inner.events_by_height.clone(),
            block_height: inner.latest_height.unwrap_or(0),
        }
    }
}
