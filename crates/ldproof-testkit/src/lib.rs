//! # ldproof testkit
//!
//! Testing utilities for anchored linked data proofs.
//!
//! - **Fixtures**: a keypair, a DID with a registered method, an in-memory
//!   ledger and resolver, wired together
//! - **Generators**: proptest strategies for JSON and JSON-LD documents
//! - **Golden vectors**: canonicalization outputs and key derivations that
//!   must never change
//!
//! ```rust
//! use ldproof_testkit::vectors::verify_all_vectors;
//!
//! for (name, matches, actual) in verify_all_vectors() {
//!     assert!(matches, "{name}: {actual}");
//! }
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{TestFixture, SAMPLE_DID, SAMPLE_PRIVATE_KEY, SAMPLE_PUBLIC_KEY};
pub use vectors::{all_vectors, verify_all_vectors, CanonicalVector};
