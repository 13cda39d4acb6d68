//! Sandbox Core
//!
//! Fundamental types shared by the sandbox chain: content-hash
//! identifiers, account addresses, the chain entities (blocks,
//! collections, transactions, results, events) and the register/delta
//! types that describe ledger state changes.

#![warn(missing_docs)]

/// Account address type
pub mod address;
/// Block and block header structures
pub mod block;
/// Transaction collection structures
pub mod collection;
/// Chain event structures
pub mod event;
/// Content-hash identifier type
pub mod identifier;
/// Ledger register keys and write sets
pub mod register;
/// Transaction bodies, statuses and results
pub mod transaction;

pub use address::Address;
pub use block::Block;
pub use collection::Collection;
pub use event::Event;
pub use identifier::Identifier;
pub use register::{Delta, RegisterKey};
pub use transaction::{TransactionBody, TransactionResult, TransactionStatus};

/// Result type for core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed identifier or address string
    #[error("invalid hex encoding: {0}")]
    InvalidHex(String),

    /// Byte slice of the wrong length for a fixed-size type
    #[error("invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength {
        /// Expected byte length
        expected: usize,
        /// Actual byte length
        actual: usize,
    },
}
