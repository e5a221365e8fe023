//! Anchoring channel handles.
//!
//! A channel starts life as an [`UnboundChannel`], which only knows its node.
//! Binding commits a genesis record to the ledger and yields an
//! [`AnchoringChannel`] with a fixed channel ID and first anchorage.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tracing::{debug, info, warn};

use ldproof_core::{Anchorage, AnchorageId, ChannelId};

use crate::error::{ChannelError, Result};
use crate::transport::LedgerTransport;

/// Timeouts applied to ledger calls.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Upper bound on a genesis or anchor submission. Exceeding it makes the
    /// outcome indeterminate.
    pub submit_timeout: Duration,
    /// Upper bound on a read.
    pub read_timeout: Duration,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            submit_timeout: Duration::from_secs(30),
            read_timeout: Duration::from_secs(10),
        }
    }
}

impl ChannelConfig {
    pub fn with_submit_timeout(mut self, timeout: Duration) -> Self {
        self.submit_timeout = timeout;
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }
}

/// Check that `node` looks like `http(s)://host[...]`.
pub fn validate_node(node: &str) -> Result<()> {
    let rest = node
        .strip_prefix("https://")
        .or_else(|| node.strip_prefix("http://"))
        .ok_or_else(|| ChannelError::InvalidNode(format!("unsupported scheme: {node:?}")))?;

    let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
    if host.is_empty() {
        return Err(ChannelError::InvalidNode(format!("missing host: {node:?}")));
    }
    if node.chars().any(char::is_whitespace) {
        return Err(ChannelError::InvalidNode(format!("whitespace in node: {node:?}")));
    }
    Ok(())
}

/// A channel that has not been committed to the ledger yet.
///
/// It has no `anchor` method; bind it first.
pub struct UnboundChannel<T: LedgerTransport> {
    node: String,
    transport: Arc<T>,
    config: ChannelConfig,
}

impl<T: LedgerTransport> UnboundChannel<T> {
    /// Create a channel for `node`. Purely local.
    pub fn create(node: impl Into<String>, transport: Arc<T>) -> Result<Self> {
        let node = node.into();
        validate_node(&node)?;
        Ok(Self {
            node,
            transport,
            config: ChannelConfig::default(),
        })
    }

    pub fn with_config(mut self, config: ChannelConfig) -> Self {
        self.config = config;
        self
    }

    pub fn node(&self) -> &str {
        &self.node
    }

    /// Commit the genesis record and return the bound channel.
    ///
    /// A failed bind is not retried. On timeout the genesis may still land,
    /// in which case the channel is orphaned.
    pub async fn bind(self) -> Result<AnchoringChannel<T>> {
        let receipt = match tokio::time::timeout(
            self.config.submit_timeout,
            self.transport.submit_genesis(&self.node),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => {
                warn!(node = %self.node, "genesis submission timed out");
                return Err(ChannelError::Indeterminate {
                    channel_id: None,
                    anchorage_id: None,
                });
            }
        };

        info!(
            channel_id = %receipt.channel_id,
            node = %self.node,
            "channel bound"
        );

        Ok(AnchoringChannel {
            inner: Arc::new(ChannelInner {
                node: self.node,
                channel_id: receipt.channel_id,
                first_anchorage_id: receipt.first_anchorage_id,
                config: self.config,
            }),
            transport: self.transport,
        })
    }
}

struct ChannelInner {
    node: String,
    channel_id: ChannelId,
    first_anchorage_id: AnchorageId,
    config: ChannelConfig,
}

/// A bound, append-only anchoring channel.
///
/// Cloning is cheap. Clones share the transport, and concurrent `anchor`
/// calls are serialized by the ledger, not by this handle.
pub struct AnchoringChannel<T: LedgerTransport> {
    inner: Arc<ChannelInner>,
    transport: Arc<T>,
}

impl<T: LedgerTransport> Clone for AnchoringChannel<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<T: LedgerTransport> fmt::Debug for AnchoringChannel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnchoringChannel")
            .field("node", &self.inner.node)
            .field("channel_id", &self.inner.channel_id)
            .field("first_anchorage_id", &self.inner.first_anchorage_id)
            .finish()
    }
}

impl<T: LedgerTransport> AnchoringChannel<T> {
    pub fn channel_id(&self) -> ChannelId {
        self.inner.channel_id
    }

    pub fn first_anchorage_id(&self) -> AnchorageId {
        self.inner.first_anchorage_id
    }

    pub fn node(&self) -> &str {
        &self.inner.node
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Anchor `payload` at `anchorage_id` and return the next anchorage.
    ///
    /// Nothing is retried. If the submission outlives
    /// [`ChannelConfig::submit_timeout`] the result is
    /// [`ChannelError::Indeterminate`]: the payload may or may not be on the
    /// ledger, and reading the anchorage is the only way to find out.
    pub async fn anchor(&self, payload: &[u8], anchorage_id: &AnchorageId) -> Result<AnchorageId> {
        let channel_id = self.inner.channel_id;
        debug!(%channel_id, %anchorage_id, len = payload.len(), "anchoring");

        let submission = self
            .transport
            .submit_anchor(&channel_id, anchorage_id, payload);

        match tokio::time::timeout(self.inner.config.submit_timeout, submission).await {
            Ok(Ok(next)) => {
                info!(%channel_id, %anchorage_id, next = %next, "anchored");
                Ok(next)
            }
            Ok(Err(e)) => {
                warn!(%channel_id, %anchorage_id, error = %e, "anchor rejected");
                Err(e)
            }
            Err(_) => {
                warn!(%channel_id, %anchorage_id, "anchor submission timed out");
                Err(ChannelError::Indeterminate {
                    channel_id: Some(channel_id),
                    anchorage_id: Some(*anchorage_id),
                })
            }
        }
    }

    /// Read the payload anchored at `anchorage_id` of any channel.
    pub async fn fetch(&self, channel_id: &ChannelId, anchorage_id: &AnchorageId) -> Result<Bytes> {
        self.reader().fetch(channel_id, anchorage_id).await
    }

    /// A read-only handle sharing this channel's transport.
    pub fn reader(&self) -> ChannelReader<T> {
        ChannelReader {
            transport: Arc::clone(&self.transport),
            read_timeout: self.inner.config.read_timeout,
        }
    }
}

/// Read-only access to anchored payloads.
///
/// Verifiers use this directly; they never need a bound channel.
pub struct ChannelReader<T: LedgerTransport> {
    transport: Arc<T>,
    read_timeout: Duration,
}

impl<T: LedgerTransport> Clone for ChannelReader<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            read_timeout: self.read_timeout,
        }
    }
}

impl<T: LedgerTransport> ChannelReader<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self {
            transport,
            read_timeout: ChannelConfig::default().read_timeout,
        }
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Read the full anchorage record.
    ///
    /// `AnchorageNotFound` if nothing was anchored there. A timed-out read is
    /// a plain transport error since reads have no side effects.
    pub async fn fetch_anchorage(
        &self,
        channel_id: &ChannelId,
        anchorage_id: &AnchorageId,
    ) -> Result<Anchorage> {
        let read = self.transport.read_anchor(channel_id, anchorage_id);
        let found = with_read_timeout(self.read_timeout, read).await??;

        found.ok_or(ChannelError::AnchorageNotFound {
            channel_id: *channel_id,
            anchorage_id: *anchorage_id,
        })
    }

    /// Read just the anchored payload.
    pub async fn fetch(&self, channel_id: &ChannelId, anchorage_id: &AnchorageId) -> Result<Bytes> {
        let anchorage = self.fetch_anchorage(channel_id, anchorage_id).await?;
        debug!(%channel_id, %anchorage_id, index = anchorage.index, "fetched");
        Ok(anchorage.payload)
    }
}

async fn with_read_timeout<F, O>(timeout: Duration, fut: F) -> Result<O>
where
    F: Future<Output = O>,
{
    tokio::time::timeout(timeout, fut)
        .await
        .map_err(|_| ChannelError::Transport(format!("read timed out after {timeout:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryLedger;

    async fn bound() -> (Arc<MemoryLedger>, AnchoringChannel<MemoryLedger>) {
        let ledger = Arc::new(MemoryLedger::new());
        let channel = UnboundChannel::create("https://node.example", Arc::clone(&ledger))
            .unwrap()
            .bind()
            .await
            .unwrap();
        (ledger, channel)
    }

    #[test]
    fn test_validate_node() {
        assert!(validate_node("https://chrysalis-nodes.iota.org").is_ok());
        assert!(validate_node("http://localhost:14265/api").is_ok());

        for bad in ["", "node.example", "ftp://node.example", "https://", "https:///path", "https://a b"] {
            assert!(
                matches!(validate_node(bad), Err(ChannelError::InvalidNode(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn test_create_rejects_bad_node() {
        let ledger = Arc::new(MemoryLedger::new());
        let err = UnboundChannel::create("not a url", ledger.clone()).err().unwrap();
        assert!(matches!(err, ChannelError::InvalidNode(_)));
        assert_eq!(ledger.channel_count(), 0);
    }

    #[tokio::test]
    async fn test_bind_fixes_identifiers() {
        let (ledger, channel) = bound().await;
        assert_eq!(ledger.channel_count(), 1);
        assert_eq!(
            channel.first_anchorage_id(),
            AnchorageId::derive(&channel.channel_id(), 1)
        );
        assert_eq!(channel.node(), "https://node.example");
    }

    #[tokio::test]
    async fn test_anchor_then_fetch() {
        let (_, channel) = bound().await;
        let first = channel.first_anchorage_id();

        let second = channel.anchor(b"one", &first).await.unwrap();
        let third = channel.anchor(b"two", &second).await.unwrap();
        assert_ne!(second, third);

        let bytes = channel.fetch(&channel.channel_id(), &first).await.unwrap();
        assert_eq!(&bytes[..], b"one");
        let bytes = channel.fetch(&channel.channel_id(), &second).await.unwrap();
        assert_eq!(&bytes[..], b"two");

        let err = channel.fetch(&channel.channel_id(), &third).await.unwrap_err();
        assert!(matches!(err, ChannelError::AnchorageNotFound { .. }));
    }

    #[tokio::test]
    async fn test_double_anchor_keeps_first_payload() {
        let (_, channel) = bound().await;
        let first = channel.first_anchorage_id();

        channel.anchor(b"first", &first).await.unwrap();
        let err = channel.anchor(b"second", &first).await.unwrap_err();
        assert!(matches!(err, ChannelError::AnchorageConsumed { .. }));

        let bytes = channel.fetch(&channel.channel_id(), &first).await.unwrap();
        assert_eq!(&bytes[..], b"first");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_anchor_single_winner() {
        let (ledger, channel) = bound().await;
        let first = channel.first_anchorage_id();
        let other = channel.clone();

        let (a, b) = tokio::join!(channel.anchor(b"a", &first), other.anchor(b"b", &first));

        let wins = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
        assert_eq!(wins, 1);
        let loser = if a.is_ok() { b.unwrap_err() } else { a.unwrap_err() };
        assert!(matches!(loser, ChannelError::AnchorageConsumed { .. }));
        assert_eq!(ledger.anchorages(&channel.channel_id()).len(), 1);
    }

    #[tokio::test]
    async fn test_submission_timeout_is_indeterminate() {
        let ledger = Arc::new(MemoryLedger::new());
        let channel = UnboundChannel::create("https://node.example", Arc::clone(&ledger))
            .unwrap()
            .with_config(ChannelConfig::default().with_submit_timeout(Duration::from_millis(20)))
            .bind()
            .await
            .unwrap();

        ledger.set_latency(Duration::from_millis(500));
        let err = channel
            .anchor(b"slow", &channel.first_anchorage_id())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ChannelError::Indeterminate {
                channel_id: Some(_),
                anchorage_id: Some(_)
            }
        ));
    }

    #[tokio::test]
    async fn test_offline_transport() {
        let (ledger, channel) = bound().await;
        ledger.set_offline(true);

        let err = channel
            .anchor(b"x", &channel.first_anchorage_id())
            .await
            .unwrap_err();
        assert!(matches!(err, ChannelError::Transport(_)));
    }

    #[tokio::test]
    async fn test_reader_on_unknown_channel() {
        let (ledger, _) = bound().await;
        let reader = ChannelReader::new(ledger);
        let ghost = ChannelId::from_bytes([0xab; 32]);
        let err = reader
            .fetch(&ghost, &AnchorageId::derive(&ghost, 1))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
