//! Error types for the service facade.

use ldproof_channel::ChannelError;
use ldproof_core::CoreError;
use ldproof_did::DidError;
use ldproof_protocol::{ErrorClass, ProofError};
use thiserror::Error;

/// Errors that can occur through the [`LdProofs`](crate::LdProofs) handle.
#[derive(Debug, Error)]
pub enum LdProofsError {
    /// Configuration is unusable.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Key material or encoded data is malformed.
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    #[error("channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("identity error: {0}")]
    Did(#[from] DidError),

    #[error("proof error: {0}")]
    Proof(#[from] ProofError),
}

impl LdProofsError {
    pub fn class(&self) -> ErrorClass {
        match self {
            LdProofsError::Config(_) => ErrorClass::InvalidInput,
            LdProofsError::Core(CoreError::MalformedKey(_) | CoreError::InvalidPublicKey) => {
                ErrorClass::Identity
            }
            LdProofsError::Core(_) => ErrorClass::Cryptographic,
            LdProofsError::Channel(e) => ErrorClass::of_channel(e),
            LdProofsError::Did(e) => ErrorClass::of_did(e),
            LdProofsError::Proof(e) => e.class(),
        }
    }
}

/// Result type for facade operations.
pub type Result<T> = std::result::Result<T, LdProofsError>;
