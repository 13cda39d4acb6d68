//! # Sandbox-RS: Local Contract Sandbox
//!
//! An in-process playground for experimenting with smart contract
//! projects. Opening a project clones its sources, boots a disposable
//! embedded chain, deploys the project's contracts, and then serves
//! script reads and transaction commits against that chain.
//!
//! ## Architecture
//!
//! The implementation is organized into several crates:
//!
//! - [`sandbox_core`] - Identifiers, addresses, registers, and block types
//! - [`sandbox_config`] - Server and chain configuration
//! - [`sandbox_store`] - The embedded chain-state store and snapshot tree
//! - [`sandbox_chain`] - The chain instance and execution engine boundary
//! - [`sandbox_source`] - Project source providers
//! - [`sandbox_project`] - The project orchestrator

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub use sandbox_chain as chain;
pub use sandbox_config as config;
pub use sandbox_core as core;
pub use sandbox_project as project;
pub use sandbox_source as source;
pub use sandbox_store as store;

/// Common imports for sandbox development
pub mod prelude {
    pub use crate::chain::{Blockchain, ExecutionEngine, KeyValueEngine};
    pub use crate::config::{ChainConfig, ServerConfig};
    pub use crate::core::{Address, Block, Delta, Identifier, RegisterKey};
    pub use crate::project::Project;
    pub use crate::source::{LocalDirectorySource, SourceProvider};
    pub use crate::store::{ChainStore, SnapshotTree};
}
