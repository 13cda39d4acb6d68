//! Account addresses.

use crate::{Error, Result};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A 64-bit account address.
///
/// The sandbox uses a flat, single-chain address space; the service
/// account always lives at [`Address::SERVICE`].
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address([u8; Address::LENGTH]);

impl Address {
    /// The length of an address in bytes.
    pub const LENGTH: usize = 8;

    /// The service account address (first address on the chain).
    pub const SERVICE: Self = Self([0, 0, 0, 0, 0, 0, 0, 1]);

    /// Creates an address from a byte slice.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != Self::LENGTH {
            return Err(Error::InvalidLength {
                expected: Self::LENGTH,
                actual: bytes.len(),
            });
        }
        let mut data = [0u8; Self::LENGTH];
        data.copy_from_slice(bytes);
        Ok(Self(data))
    }

    /// Creates the n-th address of the flat sandbox address space.
    pub fn at_index(index: u64) -> Self {
        Self(index.to_be_bytes())
    }

    /// Returns the raw address bytes.
    pub fn as_bytes(&self) -> &[u8; Self::LENGTH] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|e| Error::InvalidHex(e.to_string()))?;
        Self::from_bytes(&bytes)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

struct AddressVisitor;

impl Visitor<'_> for AddressVisitor {
    type Value = Address;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a 16-character hex string")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> std::result::Result<Address, E> {
        value.parse().map_err(de::Error::custom)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_str(AddressVisitor)
    }
}
