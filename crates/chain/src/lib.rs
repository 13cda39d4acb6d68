//! Sandbox Chain
//!
//! A disposable, in-process chain instance. The [`Blockchain`] owns an
//! embedded [`sandbox_store::ChainStore`], bootstraps a genesis block
//! and the service account, and turns engine execution output into
//! atomic block commits. Script and transaction interpretation sits
//! behind the [`ExecutionEngine`] boundary; the built-in
//! [`KeyValueEngine`] is a deterministic register machine that stands
//! in for a full contract-language interpreter.

#![warn(missing_docs)]

/// The chain instance
pub mod blockchain;
/// The execution engine boundary and the built-in engine
pub mod engine;

pub use blockchain::{
    Blockchain, ContractDescriptor, ACCOUNT_CREATED_EVENT, CHAIN_STARTED_EVENT,
    CONTRACT_DEPLOYED_EVENT,
};
pub use engine::{EmittedEvent, ExecutionEngine, ExecutionOutput, KeyValueEngine, ScriptResult};

/// Result type for chain operations
pub type Result<T> = std::result::Result<T, Error>;

/// Chain error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The underlying store rejected an operation.
    #[error("store error: {0}")]
    Store(#[from] sandbox_store::Error),

    /// The execution engine itself failed (not a failed transaction:
    /// transaction failures are recorded on chain as results).
    #[error("engine error: {0}")]
    Engine(String),

    /// A request was malformed before it reached the engine.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}
