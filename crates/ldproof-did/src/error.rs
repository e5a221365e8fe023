//! Error types for DID handling and signing.

use ldproof_core::CoreError;
use thiserror::Error;

/// Errors that can occur while parsing, resolving or signing with DIDs.
#[derive(Debug, Error)]
pub enum DidError {
    #[error("invalid DID: {0}")]
    InvalidDid(String),

    #[error("invalid verification method reference: {0}")]
    InvalidMethodRef(String),

    /// The resolver has no document for this DID.
    #[error("DID not found: {0}")]
    NotFound(String),

    /// The resolver itself failed.
    #[error("resolution failed: {0}")]
    Resolution(String),

    #[error("verification method not found: {0}")]
    MethodNotFound(String),

    #[error("verification method revoked: {0}")]
    MethodRevoked(String),

    /// The method publishes a key this crate cannot use.
    #[error("verification method {method} has unsupported key type {key_type}")]
    UnsupportedKeyType { method: String, key_type: String },

    /// Signing was refused for this method.
    #[error("cannot sign with {method}: {reason}")]
    Signing { method: String, reason: String },

    #[error("malformed key: {0}")]
    MalformedKey(String),

    #[error("malformed signature: {0}")]
    MalformedSignature(String),

    #[error("malformed DID document: {0}")]
    MalformedDocument(String),
}

impl From<CoreError> for DidError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::MalformedKey(reason) => DidError::MalformedKey(reason),
            CoreError::InvalidPublicKey => DidError::MalformedKey("not a valid Ed25519 point".into()),
            CoreError::MalformedSignature(reason) => DidError::MalformedSignature(reason),
            other => DidError::MalformedDocument(other.to_string()),
        }
    }
}

/// Result type for DID operations.
pub type Result<T> = std::result::Result<T, DidError>;
