//! # ldproof protocol
//!
//! Generates and verifies linked data proofs whose digest and signature are
//! anchored in an append-only channel.
//!
//! ## Key Types
//!
//! - [`LdProofGenerator`] - Canonicalize, digest, sign, anchor, attach `proof`
//! - [`LdProofVerifier`] - Fetch the anchor, recompute, resolve, check
//! - [`Canonicalizer`] - Pluggable document canonicalization
//! - [`RequestVerifier`] - Checks raw signed messages without a document
//!
//! ## Design Notes
//!
//! - **One generic path**: JSON and JSON-LD differ only in the canonicalizer
//!   passed to [`LdProofGenerator::build`] and [`LdProofVerifier::verify`].
//! - **Outcomes vs errors**: a tampered document or a bad signature is a
//!   [`VerificationOutcome`], not an error.

pub mod canonicalize;
pub mod error;
pub mod generator;
pub mod proof;
pub mod request;
pub mod verifier;

pub use canonicalize::{infer_canonicalizer, Canonicalizer, JsonCanonicalizer, JsonLdCanonicalizer};
pub use error::{ErrorClass, ProofError, Result};
pub use generator::{GenerationStage, LdProofGenerator, SignedDocument};
pub use proof::{LinkedDataProof, ProofValue, IOTA_LD_PROOF_2021, PROOF_FIELD};
pub use request::{RequestVerifier, VerificationRequest, ED25519_SIGNATURE_TYPE};
pub use verifier::{LdProofVerifier, VerificationFailure, VerificationOutcome};
