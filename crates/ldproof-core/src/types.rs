//! Channel and anchorage identifiers.
//!
//! Both are 32-byte newtypes. Their text form is lowercase hex, which is also
//! how they appear inside a proof's `proofValue`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Domain separator for anchorage ID derivation.
const ANCHORAGE_DOMAIN: &[u8] = b"ldproof-anchorage-v0:";

/// A 32-byte channel identifier.
///
/// Computed as Blake3(canonical_genesis_bytes(genesis)), so it is fixed by the
/// binding transaction and cannot be chosen by the caller.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelId(pub [u8; 32]);

impl ChannelId {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string.
    pub fn from_hex(s: &str) -> Result<Self, CoreError> {
        parse_hex32(s).map(Self)
    }
}

impl fmt::Debug for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChannelId({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for ChannelId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl AsRef<[u8]> for ChannelId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for ChannelId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ChannelId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A 32-byte anchorage identifier.
///
/// Derived from the owning channel and the slot index, so every slot of a
/// channel has exactly one ID and an ID is never reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnchorageId(pub [u8; 32]);

impl AnchorageId {
    /// Derive the ID of the slot at `index` (1-indexed) within `channel_id`.
    pub fn derive(channel_id: &ChannelId, index: u64) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(ANCHORAGE_DOMAIN);
        hasher.update(&channel_id.0);
        hasher.update(&index.to_be_bytes());
        Self(*hasher.finalize().as_bytes())
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string.
    pub fn from_hex(s: &str) -> Result<Self, CoreError> {
        parse_hex32(s).map(Self)
    }
}

impl fmt::Debug for AnchorageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AnchorageId({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for AnchorageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for AnchorageId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl AsRef<[u8]> for AnchorageId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<&[u8]> for AnchorageId {
    type Error = CoreError;

    fn try_from(slice: &[u8]) -> Result<Self, Self::Error> {
        let arr: [u8; 32] = slice
            .try_into()
            .map_err(|_| CoreError::InvalidIdentifier("expected 32 bytes".into()))?;
        Ok(Self(arr))
    }
}

impl Serialize for AnchorageId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for AnchorageId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

fn parse_hex32(s: &str) -> Result<[u8; 32], CoreError> {
    let bytes = hex::decode(s).map_err(|e| CoreError::InvalidIdentifier(e.to_string()))?;
    bytes
        .try_into()
        .map_err(|_| CoreError::InvalidIdentifier(format!("expected 64 hex chars, got {}", s.len())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_id_hex_roundtrip() {
        let id = ChannelId::from_bytes([0x42; 32]);
        let recovered: ChannelId = id.to_hex().parse().unwrap();
        assert_eq!(id, recovered);
    }

    #[test]
    fn test_anchorage_id_derivation_is_positional() {
        let channel = ChannelId::from_bytes([0x01; 32]);
        let other = ChannelId::from_bytes([0x02; 32]);

        assert_eq!(AnchorageId::derive(&channel, 1), AnchorageId::derive(&channel, 1));
        assert_ne!(AnchorageId::derive(&channel, 1), AnchorageId::derive(&channel, 2));
        assert_ne!(AnchorageId::derive(&channel, 1), AnchorageId::derive(&other, 1));
    }

    #[test]
    fn test_ids_serialize_as_hex_strings() {
        let id = AnchorageId::from_bytes([0xab; 32]);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", "ab".repeat(32)));

        let back: AnchorageId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_rejects_short_hex() {
        assert!(matches!(
            "abcd".parse::<ChannelId>(),
            Err(CoreError::InvalidIdentifier(_))
        ));
        assert!("zz".repeat(32).parse::<AnchorageId>().is_err());
    }

    #[test]
    fn test_debug_is_truncated() {
        let id = ChannelId::from_bytes([0xcd; 32]);
        assert_eq!(format!("{:?}", id), "ChannelId(cdcdcdcdcdcdcdcd)");
    }
}
