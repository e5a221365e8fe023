//! Cryptographic primitives.
//!
//! Wraps Ed25519 signing and Blake3 hashing with strong types. Text forms of
//! keys and signatures are base58btc, as published in DID documents.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use std::fmt;

use crate::error::CoreError;

/// A 32-byte Blake3 hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Blake3Hash(pub [u8; 32]);

impl Blake3Hash {
    /// Compute the Blake3 hash of the given data.
    pub fn hash(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Blake3Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Blake3({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for Blake3Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// A 32-byte Ed25519 public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ed25519PublicKey(pub [u8; 32]);

impl Ed25519PublicKey {
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Encode as base58btc (the `publicKeyBase58` form).
    pub fn to_base58(&self) -> String {
        bs58::encode(self.0).into_string()
    }

    /// Decode from base58btc.
    pub fn from_base58(s: &str) -> Result<Self, CoreError> {
        decode_base58_array(s)
            .map(Self)
            .map_err(CoreError::MalformedKey)
    }

    /// Verify a signature over a message.
    ///
    /// Returns `InvalidPublicKey` if the bytes are not a curve point and
    /// `InvalidSignature` if the signature does not match.
    pub fn verify(&self, message: &[u8], signature: &Ed25519Signature) -> Result<(), CoreError> {
        let verifying_key =
            VerifyingKey::from_bytes(&self.0).map_err(|_| CoreError::InvalidPublicKey)?;

        let sig = Signature::from_bytes(&signature.0);

        verifying_key
            .verify(message, &sig)
            .map_err(|_| CoreError::InvalidSignature)
    }
}

impl fmt::Debug for Ed25519PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ed25519Pub({})", &self.to_hex()[..16])
    }
}

/// A 64-byte Ed25519 signature.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Ed25519Signature(pub [u8; 64]);

impl Ed25519Signature {
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Encode as base58btc (the `signatureValue` form).
    pub fn to_base58(&self) -> String {
        bs58::encode(self.0).into_string()
    }

    /// Decode from base58btc.
    pub fn from_base58(s: &str) -> Result<Self, CoreError> {
        decode_base58_array(s)
            .map(Self)
            .map_err(CoreError::MalformedSignature)
    }
}

impl fmt::Debug for Ed25519Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ed25519Sig({}...)", &self.to_hex()[..16])
    }
}

/// An Ed25519 keypair.
///
/// The private half is the 32-byte seed. Callers hand it to the signer per
/// operation; nothing here persists it.
#[derive(Clone)]
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Generate a new random keypair.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let signing_key = SigningKey::generate(&mut rng);
        Self { signing_key }
    }

    /// Create from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(seed);
        Self { signing_key }
    }

    /// Load a private key given as a base58btc-encoded seed.
    pub fn from_base58(s: &str) -> Result<Self, CoreError> {
        let seed: [u8; 32] = decode_base58_array(s).map_err(CoreError::MalformedKey)?;
        Ok(Self::from_seed(&seed))
    }

    /// Get the public key.
    pub fn public_key(&self) -> Ed25519PublicKey {
        Ed25519PublicKey(self.signing_key.verifying_key().to_bytes())
    }

    /// Sign a message.
    pub fn sign(&self, message: &[u8]) -> Ed25519Signature {
        let sig = self.signing_key.sign(message);
        Ed25519Signature(sig.to_bytes())
    }

    /// Get the raw seed bytes (secret key material).
    pub fn seed(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    /// Encode the seed as base58btc.
    pub fn to_base58(&self) -> String {
        bs58::encode(self.seed()).into_string()
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keypair({:?})", self.public_key())
    }
}

fn decode_base58_array<const N: usize>(s: &str) -> Result<[u8; N], String> {
    let bytes = bs58::decode(s)
        .into_vec()
        .map_err(|e| format!("invalid base58: {}", e))?;
    let len = bytes.len();
    bytes
        .try_into()
        .map_err(|_| format!("expected {} bytes, got {}", N, len))
}
