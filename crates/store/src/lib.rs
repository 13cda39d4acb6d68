//! Sandbox Chain Store
//!
//! The embedded chain-state store for one in-process, single-node
//! chain. It persists blocks, collections, transactions, transaction
//! results and emitted events behind multi-index lookups, and maintains
//! the layered ledger snapshot for every committed height.
//!
//! ## Components
//!
//! - **ChainStore**: the indexed store; all mutation flows through one
//!   atomic `commit_block` operation
//! - **SnapshotTree**: an immutable, append-only layered view of ledger
//!   state at a given height
//! - **StoreSnapshot**: a serializable projection of the indexed maps
//!   for external inspection
//!
//! The store is scoped to the lifetime of one sandboxed chain; nothing
//! survives the process and there is no pruning or fork handling.

#![warn(missing_docs)]

/// Serializable export view of the store
pub mod export;
/// Layered ledger snapshots
pub mod snapshot;
/// The indexed chain store
pub mod store;

pub use export::StoreSnapshot;
pub use snapshot::SnapshotTree;
pub use store::ChainStore;

/// Result type for store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Store error types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A lookup missed. Never used for legitimately empty results such
    /// as an event query with no matches.
    #[error("not found")]
    NotFound,

    /// A commit tuple violated a structural precondition; the store was
    /// left unmodified.
    #[error("inconsistent commit: {0}")]
    InconsistentCommit(String),
}
