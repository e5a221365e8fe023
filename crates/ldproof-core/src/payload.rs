//! The anchored payload: what a proof's `proofValue` points at.
//!
//! Encoded as canonical CBOR `{0: version, 1: digest, 2: signature}`.
//! Decoding is strict: the bytes must be exactly the canonical encoding of
//! the decoded value, so one logical payload has one byte form.

use ciborium::value::Value;

use crate::canonical::{decode_value, encode_canonical, map_get};
use crate::crypto::{Blake3Hash, Ed25519Signature};
use crate::error::CoreError;

/// The current anchored payload schema version.
pub const ANCHORED_PAYLOAD_VERSION: u8 = 0;

mod keys {
    pub const VERSION: u64 = 0;
    pub const DIGEST: u64 = 1;
    pub const SIGNATURE: u64 = 2;
}

/// The `{digest, signature}` pair written to an anchorage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnchoredPayload {
    /// Blake3 digest of the canonical document.
    pub digest: Blake3Hash,
    /// Ed25519 signature over the digest bytes.
    pub signature: Ed25519Signature,
}

impl AnchoredPayload {
    /// Pair a digest with its signature.
    pub fn new(digest: Blake3Hash, signature: Ed25519Signature) -> Self {
        Self { digest, signature }
    }

    /// Encode to canonical CBOR bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        // Integers and byte strings only; encoding cannot fail.
        encode_canonical(&self.to_value()).unwrap_or_default()
    }

    /// Decode from canonical CBOR bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CoreError> {
        let value =
            decode_value(bytes).map_err(|e| CoreError::MalformedPayload(e.to_string()))?;

        let map = match &value {
            Value::Map(m) => m,
            _ => return Err(CoreError::MalformedPayload("expected map".into())),
        };

        if map.len() != 3 {
            return Err(CoreError::MalformedPayload(format!(
                "expected 3 fields, got {}",
                map.len()
            )));
        }

        let version = match map_get(map, keys::VERSION) {
            Some(Value::Integer(i)) => u8::try_from(i128::from(*i))
                .map_err(|_| CoreError::MalformedPayload("version out of range".into()))?,
            _ => return Err(CoreError::MalformedPayload("missing version".into())),
        };
        if version != ANCHORED_PAYLOAD_VERSION {
            return Err(CoreError::UnsupportedVersion(version));
        }

        let digest: [u8; 32] = match map_get(map, keys::DIGEST) {
            Some(Value::Bytes(b)) => b
                .as_slice()
                .try_into()
                .map_err(|_| CoreError::MalformedPayload("digest must be 32 bytes".into()))?,
            _ => return Err(CoreError::MalformedPayload("missing digest".into())),
        };

        let signature: [u8; 64] = match map_get(map, keys::SIGNATURE) {
            Some(Value::Bytes(b)) => b
                .as_slice()
                .try_into()
                .map_err(|_| CoreError::MalformedPayload("signature must be 64 bytes".into()))?,
            _ => return Err(CoreError::MalformedPayload("missing signature".into())),
        };

        let payload = Self::new(Blake3Hash(digest), Ed25519Signature(signature));
        if payload.to_bytes() != bytes {
            return Err(CoreError::MalformedPayload("non-canonical encoding".into()));
        }

        Ok(payload)
    }

    fn to_value(&self) -> Value {
        Value::Map(vec![
            (
                Value::Integer(keys::VERSION.into()),
                Value::Integer(ANCHORED_PAYLOAD_VERSION.into()),
            ),
            (
                Value::Integer(keys::DIGEST.into()),
                Value::Bytes(self.digest.0.to_vec()),
            ),
            (
                Value::Integer(keys::SIGNATURE.into()),
                Value::Bytes(self.signature.0.to_vec()),
            ),
        ])
    }
}
