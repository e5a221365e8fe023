//! Error types for ldproof core.

use thiserror::Error;

/// Core errors raised while decoding keys, signatures and ledger records.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid signature")]
    InvalidSignature,

    #[error("invalid public key")]
    InvalidPublicKey,

    #[error("malformed key: {0}")]
    MalformedKey(String),

    #[error("malformed signature: {0}")]
    MalformedSignature(String),

    #[error("malformed anchored payload: {0}")]
    MalformedPayload(String),

    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("unsupported record version: {0}")]
    UnsupportedVersion(u8),

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("decoding error: {0}")]
    DecodingError(String),
}
