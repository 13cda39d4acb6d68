//! Transaction collections.

use crate::Identifier;
use serde::{Deserialize, Serialize};

/// A batch of transactions included together in one block.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    /// Identifiers of the member transactions, in execution order.
    pub transaction_ids: Vec<Identifier>,
}

impl Collection {
    /// Creates a collection over the given transactions.
    pub fn new(transaction_ids: Vec<Identifier>) -> Self {
        Self { transaction_ids }
    }

    /// Computes the collection identifier: the hash of the ordered
    /// member transaction identifiers.
    pub fn id(&self) -> Identifier {
        let mut data = Vec::with_capacity(self.transaction_ids.len() * Identifier::LENGTH);
        for transaction_id in &self.transaction_ids {
            data.extend_from_slice(transaction_id.as_bytes());
        }
        Identifier::hash_of(&data)
    }
}
