//! Linked data proof verification.
//!
//! Verification is read-only: fetch what the proof points at, recompute the
//! digest, resolve the method and check the signature. Tampering and bad
//! signatures come back as a [`VerificationOutcome`], everything else that
//! stops the check is a [`ProofError`].

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use ldproof_channel::{ChannelError, ChannelReader, LedgerTransport};
use ldproof_core::{AnchoredPayload, Blake3Hash};
use ldproof_did::{verify_signature, DidError, DidResolver, MethodRef};

use crate::canonicalize::{infer_canonicalizer, Canonicalizer, JsonCanonicalizer, JsonLdCanonicalizer};
use crate::error::{ProofError, Result};
use crate::proof::{as_object, strip_proof, LinkedDataProof};

/// Why a proof did not verify.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationFailure {
    /// The document changed after it was signed.
    DigestMismatch {
        anchored: Blake3Hash,
        computed: Blake3Hash,
    },
    /// The anchored signature was not made by the method's key.
    InvalidSignature { method: MethodRef },
}

/// Result of checking a proof that could be fully evaluated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    Verified,
    Failed(VerificationFailure),
}

impl VerificationOutcome {
    pub fn is_verified(&self) -> bool {
        matches!(self, VerificationOutcome::Verified)
    }

    pub fn failure(&self) -> Option<&VerificationFailure> {
        match self {
            VerificationOutcome::Verified => None,
            VerificationOutcome::Failed(failure) => Some(failure),
        }
    }
}

/// Verifies anchored linked data proofs.
pub struct LdProofVerifier<T: LedgerTransport, R: DidResolver> {
    reader: ChannelReader<T>,
    resolver: Arc<R>,
}

impl<T: LedgerTransport, R: DidResolver> Clone for LdProofVerifier<T, R> {
    fn clone(&self) -> Self {
        Self {
            reader: self.reader.clone(),
            resolver: Arc::clone(&self.resolver),
        }
    }
}

impl<T: LedgerTransport, R: DidResolver> LdProofVerifier<T, R> {
    pub fn new(reader: ChannelReader<T>, resolver: Arc<R>) -> Self {
        Self { reader, resolver }
    }

    /// Verify the proof on `document`, canonicalizing with `canonicalizer`.
    pub async fn verify<C: Canonicalizer + ?Sized>(
        &self,
        document: &Value,
        canonicalizer: &C,
    ) -> Result<VerificationOutcome> {
        let document = as_object(document)?;
        let proof = LinkedDataProof::from_document(document)?;
        let channel_id = proof.proof_value.channel_id;
        let anchorage_id = proof.proof_value.anchorage_id;

        let canonical = canonicalizer.canonicalize(&strip_proof(document))?;
        let computed = Blake3Hash::hash(&canonical);
        debug!(%channel_id, %anchorage_id, %computed, canonicalizer = canonicalizer.name(), "digest recomputed");

        let bytes = self
            .reader
            .fetch(&channel_id, &anchorage_id)
            .await
            .map_err(|e| match e {
                ChannelError::ChannelNotFound(_) | ChannelError::AnchorageNotFound { .. } => {
                    ProofError::AnchorNotFound {
                        channel_id,
                        anchorage_id,
                    }
                }
                other => ProofError::Channel(other),
            })?;
        let anchored = AnchoredPayload::from_bytes(&bytes).map_err(|e| ProofError::MalformedPayload {
            anchorage_id,
            reason: e.to_string(),
        })?;

        if anchored.digest != computed {
            warn!(%channel_id, %anchorage_id, "digest mismatch");
            return Ok(VerificationOutcome::Failed(VerificationFailure::DigestMismatch {
                anchored: anchored.digest,
                computed,
            }));
        }

        let method = proof.verification_method;
        let unresolvable = |e: DidError| match e {
            DidError::MalformedKey(_) => ProofError::Did(e),
            other => ProofError::UnresolvableMethod {
                method: method.to_string(),
                reason: other.to_string(),
            },
        };
        let resolved = self
            .resolver
            .resolve_method(&method)
            .await
            .map_err(unresolvable)?;
        let public_key = resolved.ed25519_public_key().map_err(unresolvable)?;

        let valid = verify_signature(anchored.digest.as_bytes(), &anchored.signature, &public_key)
            .map_err(unresolvable)?;

        if valid {
            info!(%channel_id, %anchorage_id, %method, "proof verified");
            Ok(VerificationOutcome::Verified)
        } else {
            warn!(%channel_id, %anchorage_id, %method, "signature does not match method key");
            Ok(VerificationOutcome::Failed(VerificationFailure::InvalidSignature { method }))
        }
    }

    pub async fn verify_json(&self, document: &Value) -> Result<VerificationOutcome> {
        self.verify(document, &JsonCanonicalizer).await
    }

    pub async fn verify_json_ld(&self, document: &Value) -> Result<VerificationOutcome> {
        self.verify(document, &JsonLdCanonicalizer).await
    }

    /// Verify with JSON-LD canonicalization when the document has an
    /// `@context`, plain JSON otherwise.
    pub async fn verify_inferred(&self, document: &Value) -> Result<VerificationOutcome> {
        let canonicalizer = infer_canonicalizer(as_object(document)?);
        self.verify(document, canonicalizer).await
    }
}
