//! The project manifest.
//!
//! Every sandbox project carries a `sandbox.json` at its root naming
//! the contracts to deploy and the accounts to provision.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Parsed `sandbox.json`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Contract name → source path within the project tree. Deployed
    /// in name order.
    #[serde(default)]
    pub contracts: BTreeMap<String, String>,
    /// Named accounts to create before deployment.
    #[serde(default)]
    pub accounts: Vec<String>,
}
