//! Chain events.

use serde::{Deserialize, Serialize};

/// An event emitted during block execution.
///
/// Events are append-only per block height and never mutated after
/// commit; `event_index` is the emission position within the height.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// The event type tag, e.g. `sandbox.ContractDeployed`.
    pub event_type: String,
    /// Raw event payload bytes (hex-encoded in JSON exports).
    #[serde(with = "hex_bytes")]
    pub payload: Vec<u8>,
    /// Height of the block that produced the event.
    pub block_height: u64,
    /// Emission position within the block height.
    pub event_index: u32,
}

impl Event {
    /// Creates a new event.
    pub fn new(
        event_type: impl Into<String>,
        payload: Vec<u8>,
        block_height: u64,
        event_index: u32,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            payload,
            block_height,
            event_index,
        }
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        bytes: &[u8],
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(&s).map_err(serde::de::Error::custom)
    }
}
