//! Block structures.

use crate::Identifier;
use serde::{Deserialize, Serialize};

/// A block of the sandbox chain.
///
/// Heights are dense and start at 0; the parent reference of the block
/// at height 0 is the zero identifier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Position of the block in the chain.
    pub height: u64,
    /// Identifier of the block at `height - 1`.
    pub parent_id: Identifier,
    /// Block construction time, milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
    /// Collections included in this block, in order.
    pub collection_ids: Vec<Identifier>,
}

impl Block {
    /// Creates a new block header.
    pub fn new(
        height: u64,
        parent_id: Identifier,
        timestamp_ms: u64,
        collection_ids: Vec<Identifier>,
    ) -> Self {
        Self {
            height,
            parent_id,
            timestamp_ms,
            collection_ids,
        }
    }

    /// Computes the block identifier: the hash of the header fields.
    pub fn id(&self) -> Identifier {
        let mut data = Vec::with_capacity(48 + self.collection_ids.len() * Identifier::LENGTH);
        data.extend_from_slice(&self.height.to_be_bytes());
        data.extend_from_slice(self.parent_id.as_bytes());
        data.extend_from_slice(&self.timestamp_ms.to_be_bytes());
        for collection_id in &self.collection_ids {
            data.extend_from_slice(collection_id.as_bytes());
        }
        Identifier::hash_of(&data)
    }
}
