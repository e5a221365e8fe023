//! Ledger transport abstraction.
//!
//! A transport is the distributed ledger as this crate sees it: it accepts a
//! channel genesis, accepts at most one payload per anchorage, and serves
//! anchored payloads back. Implementations may talk to a real network node,
//! a local database, or plain memory.

use async_trait::async_trait;
use ldproof_core::{Anchorage, AnchorageId, ChannelId};

use crate::error::Result;

/// What the ledger hands back after committing a genesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenesisReceipt {
    /// The identifier fixed by the genesis record.
    pub channel_id: ChannelId,
    /// The first writable anchorage.
    pub first_anchorage_id: AnchorageId,
}

/// Transport trait for submitting to and reading from a ledger.
///
/// Implementations must be thread-safe (Send + Sync) and must guarantee that
/// at most one payload survives per anchorage, even under concurrent
/// submissions.
#[async_trait]
pub trait LedgerTransport: Send + Sync {
    /// Commit a channel genesis for `node`.
    async fn submit_genesis(&self, node: &str) -> Result<GenesisReceipt>;

    /// Write `payload` at `anchorage_id`.
    ///
    /// Returns the next writable anchorage. Fails with `AnchorageConsumed` if
    /// the anchorage already holds a payload, `ChannelNotFound` or
    /// `AnchorageNotFound` if the channel or anchorage was never issued.
    async fn submit_anchor(
        &self,
        channel_id: &ChannelId,
        anchorage_id: &AnchorageId,
        payload: &[u8],
    ) -> Result<AnchorageId>;

    /// Read the anchorage record, if anything was anchored there.
    ///
    /// Fails with `ChannelNotFound` if the ledger has never seen the channel.
    async fn read_anchor(
        &self,
        channel_id: &ChannelId,
        anchorage_id: &AnchorageId,
    ) -> Result<Option<Anchorage>>;
}
