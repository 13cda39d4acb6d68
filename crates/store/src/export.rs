//! Serializable export view of the store.
//!
//! [`StoreSnapshot`] is a point-in-time projection of the id-indexed
//! maps, produced by [`crate::ChainStore::export`]. It carries the
//! indices only; raw ledger registers are too large and not versioned
//! for export.

use sandbox_core::{Block, Collection, Event, Identifier, TransactionBody, TransactionResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A read-consistent projection of the chain store.
///
/// Map keys serialize as strings (identifiers as hex, heights as
/// decimal); insertion order is not significant.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StoreSnapshot {
    /// Block identifier to block height.
    #[serde(rename = "blockIDToHeight")]
    pub block_id_to_height: HashMap<Identifier, u64>,
    /// Blocks by height.
    pub blocks: HashMap<u64, Block>,
    /// Collections by identifier.
    pub collections: HashMap<Identifier, Collection>,
    /// Transaction bodies by identifier.
    pub transactions: HashMap<Identifier, TransactionBody>,
    /// Transaction results by transaction identifier.
    #[serde(rename = "transactionResults")]
    pub transaction_results: HashMap<Identifier, TransactionResult>,
    /// Events grouped by the height that emitted them.
    #[serde(rename = "eventsByBlockHeight")]
    pub events_by_block_height: HashMap<u64, Vec<Event>>,
    /// The latest committed height (0 when the store is empty).
    #[serde(rename = "blockHeight")]
    pub block_height: u64,
}

impl StoreSnapshot {
    /// Serializes the snapshot to a JSON byte vector.
    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}
