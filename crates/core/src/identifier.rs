//! Content-hash identifiers.
//!
//! Every chain entity (block, collection, transaction) is addressed by
//! the SHA-256 hash of its canonical encoding.

use crate::{Error, Result};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// A 256-bit content hash identifying a chain entity.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identifier([u8; Identifier::LENGTH]);

impl Identifier {
    /// The length of an identifier in bytes.
    pub const LENGTH: usize = 32;

    /// The all-zero identifier.
    pub const ZERO: Self = Self([0; Self::LENGTH]);

    /// Creates an identifier from a byte slice.
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

    /// Computes the identifier of a canonical byte encoding.
    pub fn hash_of(data: &[u8]) -> Self {
        let digest = Sha256::digest(data);
        let mut bytes = [0u8; Self::LENGTH];
        bytes.copy_from_slice(&digest);
        Self(bytes)
    }

    /// Returns the raw identifier bytes.
    pub fn as_bytes(&self) -> &[u8; Self::LENGTH] {
        &self.0
    }

    /// Returns true if this is the all-zero identifier.
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identifier({})", self)
    }
}

impl FromStr for Identifier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|e| Error::InvalidHex(e.to_string()))?;
        Self::from_bytes(&bytes)
    }
}

impl Serialize for Identifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

struct IdentifierVisitor;

impl Visitor<'_> for IdentifierVisitor {
    type Value = Identifier;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a 64-character hex string")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> std::result::Result<Identifier, E> {
        value.parse().map_err(de::Error::custom)
    }
}

impl<'de> Deserialize<'de> for Identifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_str(IdentifierVisitor)
    }
}
