//! # ldproof core
//!
//! Pure primitives shared by every ldproof crate: channel and anchorage
//! identifiers, Ed25519 keys, Blake3 digests and the canonical CBOR records
//! written to a ledger.
//!
//! This crate contains no I/O, no storage, no networking.
//!
//! ## Key Types
//!
//! - [`ChannelId`] - Identifier of an append-only anchoring channel
//! - [`AnchorageId`] - Identifier of one immutable slot within a channel
//! - [`ChannelGenesis`] - The record whose hash becomes the channel ID
//! - [`AnchoredPayload`] - The `{digest, signature}` pair a proof points to
//! - [`Keypair`] - Ed25519 signing key, loadable from a base58 seed
//!
//! ## Canonicalization
//!
//! Ledger records are encoded using deterministic CBOR. See [`canonical`].

pub mod anchorage;
pub mod canonical;
pub mod crypto;
pub mod error;
pub mod payload;
pub mod types;

pub use anchorage::{Anchorage, ChannelGenesis, GENESIS_VERSION};
pub use canonical::canonical_genesis_bytes;
pub use crypto::{Blake3Hash, Ed25519PublicKey, Ed25519Signature, Keypair};
pub use error::CoreError;
pub use payload::{AnchoredPayload, ANCHORED_PAYLOAD_VERSION};
pub use types::{AnchorageId, ChannelId};
