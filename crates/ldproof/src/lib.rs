//! # ldproof
//!
//! Anchored linked data proofs for JSON and JSON-LD documents.
//!
//! ## Overview
//!
//! A proof binds a document to two things:
//!
//! - **A signature** made with an Ed25519 key published under a DID
//!   verification method.
//! - **An anchorage** in an append-only channel, which orders and timestamps
//!   the proof independently of the signer.
//!
//! The digest and signature are anchored; the document only carries a
//! pointer (`channelID`, `anchorageID`) in its `proof` field.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ldproof::{LdProofs, LdProofsConfig};
//! use ldproof::channel::MemoryLedger;
//! use ldproof::did::MemoryResolver;
//!
//! async fn example() {
//!     let service = LdProofs::new(
//!         LdProofsConfig::default(),
//!         Arc::new(MemoryLedger::new()),
//!         Arc::new(MemoryResolver::new()),
//!     )
//!     .unwrap();
//!
//!     let channel = service.create_channel().await.unwrap();
//!     let document = serde_json::json!({
//!         "@context": "https://schema.org",
//!         "type": "Organization",
//!         "name": "IOTA Foundation"
//!     });
//!
//!     let signed = service
//!         .sign_json_ld(
//!             &channel,
//!             "did:iota:EmsBSiBR7kjuYPLMHmZnyzmZY7t985t5BBsvK3Dbiw3d",
//!             &document,
//!             "key",
//!             "TEBVMPPX91ZhtBZ8R8zBP6WZpVeAnrWMnknkSHThmYk",
//!             &channel.first_anchorage_id(),
//!         )
//!         .await
//!         .unwrap();
//!
//!     assert!(service.verify(&signed.document).await.unwrap().is_verified());
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `ldproof::core` - Identifiers, keys, anchored payload codec
//! - `ldproof::channel` - Ledger transports and anchoring channels
//! - `ldproof::did` - DIDs, documents, resolvers, signer
//! - `ldproof::protocol` - Canonicalizers, generator, verifier

pub mod config;
pub mod error;
pub mod service;

pub use ldproof_channel as channel;
pub use ldproof_core as core;
pub use ldproof_did as did;
pub use ldproof_protocol as protocol;

pub use config::{LdProofsConfig, DEFAULT_NODE};
pub use error::{LdProofsError, Result};
pub use service::LdProofs;

pub use ldproof_channel::{AnchoringChannel, ChannelConfig, LedgerTransport, MemoryLedger, SqliteLedger};
pub use ldproof_core::{AnchorageId, ChannelId, Keypair};
pub use ldproof_did::{DidResolver, Signer};
pub use ldproof_protocol::{
    LdProofGenerator, LdProofVerifier, LinkedDataProof, SignedDocument, VerificationFailure,
    VerificationOutcome, IOTA_LD_PROOF_2021,
};
