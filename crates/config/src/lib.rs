//! Sandbox Configuration Module
//!
//! Configuration types and shared constants for the sandbox server and
//! its embedded chain.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Default HTTP bind port.
pub const DEFAULT_PORT: u16 = 8080;

/// Name of the project manifest the orchestrator looks for at the
/// source tree root.
pub const MANIFEST_FILE: &str = "sandbox.json";

/// Size of a content-hash identifier in bytes.
pub const HASH_SIZE: usize = 32;

/// Size of an account address in bytes.
pub const ADDRESS_SIZE: usize = 8;

/// Upper bound on the number of transactions per committed block. The
/// sandbox commits one block per transaction request, so this only
/// guards against pathological commit tuples.
pub const MAX_TRANSACTIONS_PER_BLOCK: usize = 512;

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP server binds to.
    pub bind_address: SocketAddr,
    /// Whether CORS headers are attached to responses.
    pub cors_enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)),
            cors_enabled: true,
        }
    }
}

/// Configuration of one disposable chain instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Human-readable chain identifier, recorded in genesis events.
    pub chain_id: String,
    /// Number of accounts provisioned at startup beyond the service
    /// account.
    pub initial_accounts: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            chain_id: "sandbox".to_string(),
            initial_accounts: 0,
        }
    }
}
