//! In-memory implementation of the LedgerTransport trait.
//!
//! This is primarily for testing. It has the same semantics as the SQLite
//! ledger but keeps everything in memory with no persistence. Two knobs let
//! tests exercise failure paths: an offline switch and a submission latency.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use ldproof_core::{Anchorage, AnchorageId, ChannelGenesis, ChannelId};

use crate::error::{ChannelError, Result};
use crate::transport::{GenesisReceipt, LedgerTransport};

/// In-memory ledger.
///
/// All data is lost when the ledger is dropped. Thread-safe via RwLock; the
/// lock is never held across an await point.
pub struct MemoryLedger {
    inner: RwLock<HashMap<ChannelId, ChannelLog>>,
    offline: AtomicBool,
    latency_ms: AtomicU64,
}

struct ChannelLog {
    genesis: ChannelGenesis,
    /// Anchorages in index order; `slots[i]` has index `i + 1`.
    slots: Vec<Anchorage>,
    /// Anchorage ID -> position in `slots`.
    by_id: HashMap<AnchorageId, usize>,
}

impl ChannelLog {
    /// The only anchorage that may currently be written.
    fn frontier(&self) -> AnchorageId {
        AnchorageId::derive(&self.genesis.channel_id(), self.slots.len() as u64 + 1)
    }
}

impl MemoryLedger {
    /// Create a new empty in-memory ledger.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
            offline: AtomicBool::new(false),
            latency_ms: AtomicU64::new(0),
        }
    }

    /// Make every subsequent call fail with a transport error.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Delay every submission by `latency` before it is committed.
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    /// Number of channels bound so far.
    pub fn channel_count(&self) -> usize {
        self.inner.read().map(|c| c.len()).unwrap_or(0)
    }

    /// All anchorages of a channel, in order.
    pub fn anchorages(&self, channel_id: &ChannelId) -> Vec<Anchorage> {
        self.inner
            .read()
            .ok()
            .and_then(|channels| channels.get(channel_id).map(|log| log.slots.clone()))
            .unwrap_or_default()
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(ChannelError::Transport("ledger unreachable".into()));
        }
        Ok(())
    }

    async fn simulate_latency(&self) {
        let ms = self.latency_ms.load(Ordering::SeqCst);
        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<E>(_: E) -> ChannelError {
    ChannelError::Transport("ledger lock poisoned".into())
}

#[async_trait]
impl LedgerTransport for MemoryLedger {
    async fn submit_genesis(&self, node: &str) -> Result<GenesisReceipt> {
        self.check_online()?;
        self.simulate_latency().await;

        let genesis = ChannelGenesis::new(node, rand::random(), now_millis());
        let receipt = GenesisReceipt {
            channel_id: genesis.channel_id(),
            first_anchorage_id: genesis.first_anchorage_id(),
        };

        let mut channels = self.inner.write().map_err(poisoned)?;
        channels.insert(
            receipt.channel_id,
            ChannelLog {
                genesis,
                slots: Vec::new(),
                by_id: HashMap::new(),
            },
        );

        debug!(channel_id = %receipt.channel_id, node, "genesis committed");
        Ok(receipt)
    }

    async fn submit_anchor(
        &self,
        channel_id: &ChannelId,
        anchorage_id: &AnchorageId,
        payload: &[u8],
    ) -> Result<AnchorageId> {
        self.check_online()?;
        self.simulate_latency().await;

        let mut channels = self.inner.write().map_err(poisoned)?;
        let log = channels
            .get_mut(channel_id)
            .ok_or(ChannelError::ChannelNotFound(*channel_id))?;

        if log.by_id.contains_key(anchorage_id) {
            return Err(ChannelError::AnchorageConsumed {
                channel_id: *channel_id,
                anchorage_id: *anchorage_id,
            });
        }

        if *anchorage_id != log.frontier() {
            return Err(ChannelError::AnchorageNotFound {
                channel_id: *channel_id,
                anchorage_id: *anchorage_id,
            });
        }

        let index = log.slots.len() as u64 + 1;
        let anchorage = Anchorage::new(
            *channel_id,
            index,
            Bytes::copy_from_slice(payload),
            now_millis(),
        );
        let next = anchorage.next_anchorage_id();

        log.by_id.insert(*anchorage_id, log.slots.len());
        log.slots.push(anchorage);

        debug!(%channel_id, %anchorage_id, index, "anchorage written");
        Ok(next)
    }

    async fn read_anchor(
        &self,
        channel_id: &ChannelId,
        anchorage_id: &AnchorageId,
    ) -> Result<Option<Anchorage>> {
        self.check_online()?;

        let channels = self.inner.read().map_err(poisoned)?;
        let log = channels
            .get(channel_id)
            .ok_or(ChannelError::ChannelNotFound(*channel_id))?;

        Ok(log
            .by_id
            .get(anchorage_id)
            .map(|&pos| log.slots[pos].clone()))
    }
}

/// Get current time in milliseconds.
pub(crate) fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
