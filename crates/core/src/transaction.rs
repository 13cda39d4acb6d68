//! Transaction bodies, statuses and results.

use crate::{Address, Identifier};
use serde::{Deserialize, Serialize};

/// An immutable transaction submitted to the chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionBody {
    /// The transaction source payload.
    pub script: String,
    /// JSON-encoded argument values, in declaration order.
    pub arguments: Vec<String>,
    /// Accounts authorizing the transaction.
    pub authorizers: Vec<Address>,
    /// Where the source came from (file path or synthetic location).
    pub location: String,
}

impl TransactionBody {
    /// Creates a new transaction body.
    pub fn new(
        script: impl Into<String>,
        arguments: Vec<String>,
        authorizers: Vec<Address>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            script: script.into(),
            arguments,
            authorizers,
            location: location.into(),
        }
    }

    /// Computes the transaction identifier: the hash of the canonical
    /// field encoding.
    pub fn id(&self) -> Identifier {
        let mut data = Vec::new();
        data.extend_from_slice(self.script.as_bytes());
        for argument in &self.arguments {
            data.push(0);
            data.extend_from_slice(argument.as_bytes());
        }
        for authorizer in &self.authorizers {
            data.push(1);
            data.extend_from_slice(authorizer.as_bytes());
        }
        data.push(2);
        data.extend_from_slice(self.location.as_bytes());
        Identifier::hash_of(&data)
    }
}

/// Terminal status of an executed transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Execution completed and its writes were committed.
    Succeeded,
    /// Execution failed; the failure is still recorded on chain.
    Failed,
}

/// The stored outcome of executing one transaction.
///
/// Shares its identifier with the [`TransactionBody`] it belongs to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionResult {
    /// Identifier of the executed transaction.
    pub transaction_id: Identifier,
    /// Whether execution succeeded.
    pub status: TransactionStatus,
    /// The engine's error message, present iff the status is `Failed`.
    pub error_message: Option<String>,
    /// Positions (within the block height) of the events this
    /// transaction emitted.
    pub event_indices: Vec<u32>,
}

impl TransactionResult {
    /// Creates a succeeded result.
    pub fn succeeded(transaction_id: Identifier, event_indices: Vec<u32>) -> Self {
        Self {
            transaction_id,
            status: TransactionStatus::Succeeded,
            error_message: None,
            event_indices,
        }
    }

    /// Creates a failed result carrying the engine error.
    pub fn failed(transaction_id: Identifier, error_message: impl Into<String>) -> Self {
        Self {
            transaction_id,
            status: TransactionStatus::Failed,
            error_message: Some(error_message.into()),
            event_indices: Vec::new(),
        }
    }

    /// Returns true if the transaction succeeded.
    pub fn is_succeeded(&self) -> bool {
        self.status == TransactionStatus::Succeeded
    }
}
