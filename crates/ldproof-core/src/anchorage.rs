//! Anchorage records: the genesis that creates a channel and the immutable
//! slots that follow it.

use bytes::Bytes;

use crate::canonical::canonical_genesis_bytes;
use crate::crypto::Blake3Hash;
use crate::types::{AnchorageId, ChannelId};

/// The current genesis schema version.
pub const GENESIS_VERSION: u8 = 0;

/// The record submitted to a ledger when a channel is bound.
///
/// The channel ID is the Blake3 hash of its canonical encoding, so the ledger
/// supplies the nonce to keep two channels on the same node distinct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelGenesis {
    /// Schema version (currently 0).
    pub version: u8,
    /// The node URL the channel was created against.
    pub node: String,
    /// Ledger-chosen randomness.
    pub nonce: [u8; 32],
    /// Ledger timestamp of the genesis (Unix milliseconds).
    pub created_at: i64,
}

impl ChannelGenesis {
    /// Create a genesis record.
    pub fn new(node: impl Into<String>, nonce: [u8; 32], created_at: i64) -> Self {
        Self {
            version: GENESIS_VERSION,
            node: node.into(),
            nonce,
            created_at,
        }
    }

    /// Compute the channel ID fixed by this genesis.
    pub fn channel_id(&self) -> ChannelId {
        ChannelId(Blake3Hash::hash(&canonical_genesis_bytes(self)).0)
    }

    /// The first writable anchorage of the channel.
    pub fn first_anchorage_id(&self) -> AnchorageId {
        AnchorageId::derive(&self.channel_id(), 1)
    }
}

/// One immutable slot of a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchorage {
    /// The owning channel.
    pub channel_id: ChannelId,
    /// This slot's identifier.
    pub anchorage_id: AnchorageId,
    /// Position in the channel (1-indexed, strictly increasing).
    pub index: u64,
    /// The opaque anchored bytes.
    pub payload: Bytes,
    /// The slot before this one (None for index 1).
    pub previous_anchorage_id: Option<AnchorageId>,
    /// Ledger timestamp of the write (Unix milliseconds).
    pub anchored_at: i64,
}

impl Anchorage {
    /// Build the record for slot `index`, deriving both IDs from the channel.
    pub fn new(channel_id: ChannelId, index: u64, payload: Bytes, anchored_at: i64) -> Self {
        let previous_anchorage_id = if index > 1 {
            Some(AnchorageId::derive(&channel_id, index - 1))
        } else {
            None
        };

        Self {
            channel_id,
            anchorage_id: AnchorageId::derive(&channel_id, index),
            index,
            payload,
            previous_anchorage_id,
            anchored_at,
        }
    }

    /// The ID of the slot that becomes writable once this one is written.
    pub fn next_anchorage_id(&self) -> AnchorageId {
        AnchorageId::derive(&self.channel_id, self.index + 1)
    }
}
