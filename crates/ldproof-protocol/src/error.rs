//! Error types for proof generation and verification.

use ldproof_channel::ChannelError;
use ldproof_core::{AnchorageId, ChannelId};
use ldproof_did::DidError;
use thiserror::Error;

/// Errors that can occur while generating or verifying a proof.
///
/// A digest mismatch or a bad signature is not an error; see
/// [`VerificationOutcome`](crate::VerificationOutcome).
#[derive(Debug, Error)]
pub enum ProofError {
    /// The document already carries a `proof`.
    #[error("document is already signed")]
    AlreadySigned,

    #[error("document has no proof")]
    MissingProof,

    #[error("unsupported proof type: {0}")]
    UnsupportedProofType(String),

    #[error("malformed proof: {0}")]
    MalformedProof(String),

    /// The document is not a JSON object.
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    #[error("canonicalization failed: {0}")]
    Canonicalization(String),

    /// Nothing is anchored where the proof points.
    #[error("no anchor at anchorage {anchorage_id} of channel {channel_id}")]
    AnchorNotFound {
        channel_id: ChannelId,
        anchorage_id: AnchorageId,
    },

    /// The anchored bytes are not a digest and signature.
    #[error("malformed anchored payload at {anchorage_id}: {reason}")]
    MalformedPayload {
        anchorage_id: AnchorageId,
        reason: String,
    },

    #[error("cannot resolve verification method {method}: {reason}")]
    UnresolvableMethod { method: String, reason: String },

    #[error("unsupported signature type: {0}")]
    UnsupportedSignatureType(String),

    #[error("channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("identity error: {0}")]
    Did(#[from] DidError),
}

/// Coarse grouping of failures, for callers deciding what to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The caller passed something unusable. Never worth retrying.
    InvalidInput,
    /// The ledger failed or refused. The caller owns any retry policy.
    Transport,
    /// A DID or verification method could not be used.
    Identity,
    /// Keys, signatures or anchored bytes did not fit together.
    Cryptographic,
}

impl ProofError {
    pub fn class(&self) -> ErrorClass {
        match self {
            ProofError::AlreadySigned
            | ProofError::MissingProof
            | ProofError::UnsupportedProofType(_)
            | ProofError::MalformedProof(_)
            | ProofError::InvalidDocument(_)
            | ProofError::Canonicalization(_)
            | ProofError::UnsupportedSignatureType(_) => ErrorClass::InvalidInput,

            ProofError::AnchorNotFound { .. } => ErrorClass::Transport,
            ProofError::Channel(e) => ErrorClass::of_channel(e),
            ProofError::MalformedPayload { .. } => ErrorClass::Cryptographic,
            ProofError::UnresolvableMethod { .. } => ErrorClass::Identity,
            ProofError::Did(e) => ErrorClass::of_did(e),
        }
    }
}

impl ErrorClass {
    pub fn of_channel(e: &ChannelError) -> Self {
        match e {
            ChannelError::InvalidNode(_) => ErrorClass::InvalidInput,
            _ => ErrorClass::Transport,
        }
    }

    pub fn of_did(e: &DidError) -> Self {
        match e {
            DidError::InvalidDid(_) | DidError::InvalidMethodRef(_) => ErrorClass::InvalidInput,
            DidError::Signing { .. } | DidError::MalformedSignature(_) => ErrorClass::Cryptographic,
            _ => ErrorClass::Identity,
        }
    }
}

/// Result type for proof operations.
pub type Result<T> = std::result::Result<T, ProofError>;
