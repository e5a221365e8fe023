//! Linked data proof generation.
//!
//! Generation is a straight line:
//!
//! ```text
//! Init -> Canonicalized -> Digested -> Signed -> Anchored -> ProofAssembled
//! ```
//!
//! Any failing stage aborts the run and nothing partial is returned. Anchoring
//! is never retried: if the anchorage was consumed meanwhile, the caller picks
//! a fresh one.

use std::fmt;

use serde_json::Value;
use tracing::{debug, info};

use ldproof_channel::{AnchoringChannel, LedgerTransport};
use ldproof_core::{AnchoredPayload, AnchorageId, Blake3Hash, Keypair};
use ldproof_did::{DidResolver, Signer};

use crate::canonicalize::{Canonicalizer, JsonCanonicalizer, JsonLdCanonicalizer};
use crate::error::{ProofError, Result};
use crate::proof::{as_object, attach_proof, LinkedDataProof, ProofValue, PROOF_FIELD};

/// Stages of a generation run, as they appear in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationStage {
    Init,
    Canonicalized,
    Digested,
    Signed,
    Anchored,
    ProofAssembled,
}

impl fmt::Display for GenerationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Output of a successful generation.
#[derive(Debug, Clone)]
pub struct SignedDocument {
    /// The input document with `proof` injected.
    pub document: Value,
    pub proof: LinkedDataProof,
    /// Where the channel expects the next anchor.
    pub next_anchorage_id: AnchorageId,
}

/// Builds anchored proofs with one channel and one signer.
pub struct LdProofGenerator<T: LedgerTransport, R: DidResolver> {
    channel: AnchoringChannel<T>,
    signer: Signer<R>,
}

impl<T: LedgerTransport, R: DidResolver> Clone for LdProofGenerator<T, R> {
    fn clone(&self) -> Self {
        Self {
            channel: self.channel.clone(),
            signer: self.signer.clone(),
        }
    }
}

impl<T: LedgerTransport, R: DidResolver> LdProofGenerator<T, R> {
    pub fn new(channel: AnchoringChannel<T>, signer: Signer<R>) -> Self {
        Self { channel, signer }
    }

    pub fn channel(&self) -> &AnchoringChannel<T> {
        &self.channel
    }

    pub fn signer(&self) -> &Signer<R> {
        &self.signer
    }

    /// Sign `document` with `did#method` and anchor the result at
    /// `anchorage_id`.
    pub async fn build<C: Canonicalizer + ?Sized>(
        &self,
        document: &Value,
        canonicalizer: &C,
        method: &str,
        private_key: &Keypair,
        anchorage_id: &AnchorageId,
    ) -> Result<SignedDocument> {
        let document = as_object(document)?;
        if document.contains_key(PROOF_FIELD) {
            return Err(ProofError::AlreadySigned);
        }
        let verification_method = self.signer.method(method)?;
        let channel_id = self.channel.channel_id();
        debug!(stage = %GenerationStage::Init, %verification_method, canonicalizer = canonicalizer.name());

        let canonical = canonicalizer.canonicalize(document)?;
        debug!(stage = %GenerationStage::Canonicalized, len = canonical.len());

        let digest = Blake3Hash::hash(&canonical);
        debug!(stage = %GenerationStage::Digested, %digest);

        let signature = self
            .signer
            .sign(digest.as_bytes(), private_key, method)
            .await?;
        debug!(stage = %GenerationStage::Signed, %verification_method);

        let payload = AnchoredPayload::new(digest, signature);
        let next_anchorage_id = self.channel.anchor(&payload.to_bytes(), anchorage_id).await?;
        debug!(stage = %GenerationStage::Anchored, %channel_id, %anchorage_id);

        let proof = LinkedDataProof::new(
            verification_method,
            ProofValue {
                channel_id,
                anchorage_id: *anchorage_id,
            },
        );
        let signed = attach_proof(document, &proof)?;

        info!(
            stage = %GenerationStage::ProofAssembled,
            %channel_id,
            %anchorage_id,
            method = %proof.verification_method,
            "proof generated"
        );

        Ok(SignedDocument {
            document: signed,
            proof,
            next_anchorage_id,
        })
    }

    /// [`build`](Self::build) with JCS canonicalization.
    pub async fn build_for_json(
        &self,
        document: &Value,
        method: &str,
        private_key: &Keypair,
        anchorage_id: &AnchorageId,
    ) -> Result<SignedDocument> {
        self.build(document, &JsonCanonicalizer, method, private_key, anchorage_id)
            .await
    }

    /// [`build`](Self::build) with JSON-LD canonicalization.
    pub async fn build_for_json_ld(
        &self,
        document: &Value,
        method: &str,
        private_key: &Keypair,
        anchorage_id: &AnchorageId,
    ) -> Result<SignedDocument> {
        self.build(document, &JsonLdCanonicalizer, method, private_key, anchorage_id)
            .await
    }
}
