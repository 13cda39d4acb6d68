//! Ledger registers and write sets.
//!
//! A register is a single addressable unit of ledger state, owned by an
//! account. A [`Delta`] is the set of register writes produced by
//! executing one block; deltas are stacked into snapshot trees by the
//! store.

use crate::Address;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Address of one unit of ledger state.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegisterKey {
    /// The account owning the register.
    pub owner: Address,
    /// The register name within the owner's storage.
    pub key: String,
}

impl RegisterKey {
    /// Creates a register key.
    pub fn new(owner: Address, key: impl Into<String>) -> Self {
        Self {
            owner,
            key: key.into(),
        }
    }

    /// The register holding a deployed contract's source.
    pub fn contract(owner: Address, name: &str) -> Self {
        Self::new(owner, format!("contract/{name}"))
    }

    /// The register marking an account as existing.
    pub fn account_status(owner: Address) -> Self {
        Self::new(owner, "account-status")
    }
}

impl fmt::Debug for RegisterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.key)
    }
}

/// The register writes produced by executing one block.
///
/// Iteration order is insertion order, so replaying a delta is
/// deterministic. Deltas never cross a serialization boundary; only
/// the indexed maps are exported.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Delta {
    writes: IndexMap<RegisterKey, Vec<u8>>,
}

impl Delta {
    /// Creates an empty delta.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a register write, replacing any earlier write to the
    /// same key within this delta.
    pub fn set(&mut self, key: RegisterKey, value: Vec<u8>) {
        self.writes.insert(key, value);
    }

    /// Looks up a write within this delta.
    pub fn get(&self, key: &RegisterKey) -> Option<&[u8]> {
        self.writes.get(key).map(Vec::as_slice)
    }

    /// Returns true if the delta contains no writes.
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// The number of registers written.
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    /// Iterates over the written registers in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&RegisterKey, &Vec<u8>)> {
        self.writes.iter()
    }

    /// Merges another delta on top of this one.
    pub fn extend(&mut self, other: Delta) {
        self.writes.extend(other.writes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delta_last_write_wins() {
        let mut delta = Delta::new();
        let key = RegisterKey::new(Address::SERVICE, "counter");
        delta.set(key.clone(), b"1".to_vec());
        delta.set(key.clone(), b"2".to_vec());
        assert_eq!(delta.get(&key), Some(b"2".as_slice()));
        assert_eq!(delta.len(), 1);
    }

    #[test]
    fn test_delta_preserves_insertion_order() {
        let mut delta = Delta::new();
        delta.set(RegisterKey::new(Address::SERVICE, "b"), vec![1]);
        delta.set(RegisterKey::new(Address::SERVICE, "a"), vec![2]);
        let keys: Vec<_> = delta.iter().map(|(k, _)| k.key.clone()).collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn test_register_key_helpers() {
        let contract = RegisterKey::contract(Address::SERVICE, "Counter");
        assert_eq!(contract.key, "contract/Counter");
        let status = RegisterKey::account_status(Address::at_index(7));
        assert_eq!(status.key, "account-status");
    }
}
