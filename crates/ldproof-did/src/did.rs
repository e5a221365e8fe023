//! Decentralized identifiers and verification method references.
//!
//! Only the generic DID syntax is checked here; what a method-specific ID
//! means is the resolver's business. The one exception is `did:key`, which
//! is self-describing and decoded locally.

use std::fmt;
use std::str::FromStr;

use ldproof_core::Ed25519PublicKey;
use serde::{Deserialize, Serialize};

use crate::error::{DidError, Result};

/// Multicodec prefix for Ed25519 public keys (0xed, varint-encoded).
const ED25519_MULTICODEC_PREFIX: [u8; 2] = [0xed, 0x01];

/// A parsed `did:<method>:<method-specific-id>`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Did {
    raw: String,
    method_len: usize,
}

impl Did {
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = |reason: &str| DidError::InvalidDid(format!("{s:?}: {reason}"));

        let rest = s.strip_prefix("did:").ok_or_else(|| invalid("missing did: prefix"))?;
        let (method, id) = rest
            .split_once(':')
            .ok_or_else(|| invalid("missing method-specific id"))?;

        if method.is_empty()
            || !method
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
        {
            return Err(invalid("method must be lowercase alphanumeric"));
        }
        if id.is_empty() || id.ends_with(':') {
            return Err(invalid("empty method-specific id segment"));
        }
        if !id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b':' | b'%' | b'-'))
        {
            return Err(invalid("illegal character in method-specific id"));
        }

        Ok(Self {
            raw: s.to_owned(),
            method_len: method.len(),
        })
    }

    /// The DID method, e.g. `iota` or `key`.
    pub fn method(&self) -> &str {
        &self.raw[4..4 + self.method_len]
    }

    pub fn method_specific_id(&self) -> &str {
        &self.raw[5 + self.method_len..]
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Reference the verification method `fragment` of this DID.
    pub fn join(&self, fragment: &str) -> Result<MethodRef> {
        MethodRef::new(self.clone(), fragment)
    }
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl fmt::Debug for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Did({})", self.raw)
    }
}

impl FromStr for Did {
    type Err = DidError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Did {
    type Error = DidError;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<Did> for String {
    fn from(did: Did) -> Self {
        did.raw
    }
}

/// A `did#fragment` reference to one verification method.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MethodRef {
    did: Did,
    fragment: String,
}

impl MethodRef {
    pub fn new(did: Did, fragment: &str) -> Result<Self> {
        if fragment.is_empty() || fragment.contains('#') || fragment.chars().any(char::is_whitespace)
        {
            return Err(DidError::InvalidMethodRef(format!("{did}#{fragment}")));
        }
        Ok(Self {
            did,
            fragment: fragment.to_owned(),
        })
    }

    pub fn parse(s: &str) -> Result<Self> {
        let (did, fragment) = s
            .split_once('#')
            .ok_or_else(|| DidError::InvalidMethodRef(format!("{s:?}: missing fragment")))?;
        let did = Did::parse(did).map_err(|_| DidError::InvalidMethodRef(s.to_owned()))?;
        Self::new(did, fragment)
    }

    pub fn did(&self) -> &Did {
        &self.did
    }

    pub fn fragment(&self) -> &str {
        &self.fragment
    }
}

impl fmt::Display for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.did, self.fragment)
    }
}

impl fmt::Debug for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MethodRef({self})")
    }
}

impl FromStr for MethodRef {
    type Err = DidError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for MethodRef {
    type Error = DidError;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<MethodRef> for String {
    fn from(method: MethodRef) -> Self {
        method.to_string()
    }
}

/// Derive the `did:key` identifier for an Ed25519 public key.
///
/// Format: `did:key:z` + base58btc(0xed01 || public key).
pub fn did_key_from_public_key(public_key: &Ed25519PublicKey) -> Did {
    let mut multicodec = Vec::with_capacity(2 + 32);
    multicodec.extend_from_slice(&ED25519_MULTICODEC_PREFIX);
    multicodec.extend_from_slice(public_key.as_bytes());

    let raw = format!("did:key:z{}", bs58::encode(multicodec).into_string());
    Did {
        raw,
        method_len: "key".len(),
    }
}

/// Recover the public key embedded in a `did:key` identifier.
pub fn public_key_from_did_key(did: &Did) -> Result<Ed25519PublicKey> {
    if did.method() != "key" {
        return Err(DidError::InvalidDid(format!("{did} is not a did:key")));
    }
    let encoded = did
        .method_specific_id()
        .strip_prefix('z')
        .ok_or_else(|| DidError::InvalidDid(format!("{did}: expected base58btc multibase")))?;

    let bytes = bs58::decode(encoded)
        .into_vec()
        .map_err(|e| DidError::InvalidDid(format!("{did}: {e}")))?;

    let key = bytes
        .strip_prefix(&ED25519_MULTICODEC_PREFIX)
        .ok_or_else(|| DidError::InvalidDid(format!("{did}: not an Ed25519 multicodec key")))?;
    let key: [u8; 32] = key
        .try_into()
        .map_err(|_| DidError::MalformedKey(format!("{did}: expected 32 key bytes")))?;

    Ok(Ed25519PublicKey::from_bytes(key))
}
