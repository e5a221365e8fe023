//! # ldproof did
//!
//! Decentralized identifiers for anchored linked data proofs.
//!
//! ## Key Types
//!
//! - [`Did`] / [`MethodRef`] - Parsed identifiers and `did#fragment` references
//! - [`DidDocument`] - The resolved document with its verification methods
//! - [`DidResolver`] - The async trait every resolver implements
//! - [`Signer`] - Signs payloads with keys published under a DID
//!
//! Resolvers are always passed in explicitly as `Arc<R>`; nothing here keeps
//! global state.

pub mod did;
pub mod document;
pub mod error;
pub mod resolver;
pub mod signer;

pub use did::{did_key_from_public_key, public_key_from_did_key, Did, MethodRef};
pub use document::{DidDocument, KeyType, ResolvedMethod, VerificationMethod};
pub use error::{DidError, Result};
pub use resolver::{DidResolver, KeyDidResolver, MemoryResolver};
pub use signer::{verify_encoded, verify_signature, Signer};
