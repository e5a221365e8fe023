//! SQLite implementation of the LedgerTransport trait.
//!
//! A durable, single-writer ledger. It uses rusqlite with bundled SQLite,
//! wrapped in async via tokio::spawn_blocking. Exactly-once anchoring is
//! enforced inside one transaction per submission, backed by the
//! `UNIQUE(anchorage_id)` constraint.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use ldproof_core::{canonical_genesis_bytes, Anchorage, AnchorageId, ChannelGenesis, ChannelId};

use crate::error::{ChannelError, Result};
use crate::memory::now_millis;
use crate::migration;
use crate::transport::{GenesisReceipt, LedgerTransport};

/// SQLite-based ledger.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteLedger {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteLedger {
    /// Open a SQLite ledger at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite ledger.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a blocking closure against the connection on the blocking pool.
    async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock().map_err(|e| {
                ChannelError::Database(rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_LOCKED),
                    Some(format!("mutex poisoned: {}", e)),
                ))
            })?;
            f(&mut conn)
        })
        .await
        .map_err(|e| ChannelError::Transport(format!("ledger task failed: {}", e)))?
    }
}

fn blob_to_id(bytes: Vec<u8>) -> Result<AnchorageId> {
    Ok(AnchorageId::try_from(bytes.as_slice())?)
}

#[async_trait]
impl LedgerTransport for SqliteLedger {
    async fn submit_genesis(&self, node: &str) -> Result<GenesisReceipt> {
        let genesis = ChannelGenesis::new(node, rand::random(), now_millis());

        self.run(move |conn| {
            let channel_id = genesis.channel_id();
            conn.execute(
                "INSERT INTO channels (channel_id, node, nonce, genesis, created_at, next_index)
                 VALUES (?1, ?2, ?3, ?4, ?5, 1)",
                params![
                    channel_id.as_bytes().as_slice(),
                    genesis.node,
                    genesis.nonce.as_slice(),
                    canonical_genesis_bytes(&genesis),
                    genesis.created_at,
                ],
            )?;

            debug!(%channel_id, node = %genesis.node, "genesis committed");
            Ok(GenesisReceipt {
                channel_id,
                first_anchorage_id: genesis.first_anchorage_id(),
            })
        })
        .await
    }

    async fn submit_anchor(
        &self,
        channel_id: &ChannelId,
        anchorage_id: &AnchorageId,
        payload: &[u8],
    ) -> Result<AnchorageId> {
        let channel_id = *channel_id;
        let anchorage_id = *anchorage_id;
        let payload = payload.to_vec();

        self.run(move |conn| {
            let tx = conn.transaction()?;

            let next_index: Option<i64> = tx
                .query_row(
                    "SELECT next_index FROM channels WHERE channel_id = ?1",
                    params![channel_id.as_bytes().as_slice()],
                    |row| row.get(0),
                )
                .optional()?;
            let next_index = next_index.ok_or(ChannelError::ChannelNotFound(channel_id))? as u64;

            let already_written: Option<i64> = tx
                .query_row(
                    "SELECT idx FROM anchorages WHERE anchorage_id = ?1",
                    params![anchorage_id.as_bytes().as_slice()],
                    |row| row.get(0),
                )
                .optional()?;
            if already_written.is_some() {
                return Err(ChannelError::AnchorageConsumed {
                    channel_id,
                    anchorage_id,
                });
            }

            if anchorage_id != AnchorageId::derive(&channel_id, next_index) {
                return Err(ChannelError::AnchorageNotFound {
                    channel_id,
                    anchorage_id,
                });
            }

            let anchorage = Anchorage::new(channel_id, next_index, Bytes::from(payload), now_millis());
            tx.execute(
                "INSERT INTO anchorages
                    (channel_id, idx, anchorage_id, payload, previous_anchorage_id, anchored_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    channel_id.as_bytes().as_slice(),
                    next_index as i64,
                    anchorage_id.as_bytes().as_slice(),
                    &anchorage.payload[..],
                    anchorage
                        .previous_anchorage_id
                        .map(|id| id.as_bytes().to_vec()),
                    anchorage.anchored_at,
                ],
            )?;
            tx.execute(
                "UPDATE channels SET next_index = ?1 WHERE channel_id = ?2",
                params![next_index as i64 + 1, channel_id.as_bytes().as_slice()],
            )?;
            tx.commit()?;

            debug!(%channel_id, %anchorage_id, index = next_index, "anchorage written");
            Ok(anchorage.next_anchorage_id())
        })
        .await
    }

    async fn read_anchor(
        &self,
        channel_id: &ChannelId,
        anchorage_id: &AnchorageId,
    ) -> Result<Option<Anchorage>> {
        let channel_id = *channel_id;
        let anchorage_id = *anchorage_id;

        self.run(move |conn| {
            let known: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM channels WHERE channel_id = ?1",
                    params![channel_id.as_bytes().as_slice()],
                    |row| row.get(0),
                )
                .optional()?;
            if known.is_none() {
                return Err(ChannelError::ChannelNotFound(channel_id));
            }

            let row: Option<(i64, Vec<u8>, Option<Vec<u8>>, i64)> = conn
                .query_row(
                    "SELECT idx, payload, previous_anchorage_id, anchored_at
                     FROM anchorages WHERE channel_id = ?1 AND anchorage_id = ?2",
                    params![
                        channel_id.as_bytes().as_slice(),
                        anchorage_id.as_bytes().as_slice()
                    ],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
                )
                .optional()?;

            let Some((idx, payload, previous, anchored_at)) = row else {
                return Ok(None);
            };

            Ok(Some(Anchorage {
                channel_id,
                anchorage_id,
                index: idx as u64,
                payload: Bytes::from(payload),
                previous_anchorage_id: previous.map(blob_to_id).transpose()?,
                anchored_at,
            }))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sqlite_anchor_and_read() {
        let ledger = SqliteLedger::open_memory().unwrap();
        let genesis = ledger.submit_genesis("https://node.example").await.unwrap();

        let next = ledger
            .submit_anchor(&genesis.channel_id, &genesis.first_anchorage_id, b"hello")
            .await
            .unwrap();
        assert_eq!(next, AnchorageId::derive(&genesis.channel_id, 2));

        let anchorage = ledger
            .read_anchor(&genesis.channel_id, &genesis.first_anchorage_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(anchorage.index, 1);
        assert_eq!(&anchorage.payload[..], b"hello");
        assert_eq!(anchorage.previous_anchorage_id, None);

        let missing = ledger.read_anchor(&genesis.channel_id, &next).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_sqlite_exactly_once() {
        let ledger = SqliteLedger::open_memory().unwrap();
        let genesis = ledger.submit_genesis("https://node.example").await.unwrap();
        let first = genesis.first_anchorage_id;

        ledger
            .submit_anchor(&genesis.channel_id, &first, b"first")
            .await
            .unwrap();
        let err = ledger
            .submit_anchor(&genesis.channel_id, &first, b"second")
            .await
            .unwrap_err();
        assert!(matches!(err, ChannelError::AnchorageConsumed { .. }));

        let anchorage = ledger
            .read_anchor(&genesis.channel_id, &first)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(&anchorage.payload[..], b"first");
    }

    #[tokio::test]
    async fn test_sqlite_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.db");

        let (channel_id, first, second) = {
            let ledger = SqliteLedger::open(&path).unwrap();
            let genesis = ledger.submit_genesis("https://node.example").await.unwrap();
            let second = ledger
                .submit_anchor(&genesis.channel_id, &genesis.first_anchorage_id, b"one")
                .await
                .unwrap();
            (genesis.channel_id, genesis.first_anchorage_id, second)
        };

        let ledger = SqliteLedger::open(&path).unwrap();
        let stored = ledger.read_anchor(&channel_id, &first).await.unwrap().unwrap();
        assert_eq!(&stored.payload[..], b"one");

        // The frontier survived the reopen.
        ledger.submit_anchor(&channel_id, &second, b"two").await.unwrap();
        let stored = ledger.read_anchor(&channel_id, &second).await.unwrap().unwrap();
        assert_eq!(stored.previous_anchorage_id, Some(first));
    }

    #[tokio::test]
    async fn test_sqlite_unknown_channel() {
        let ledger = SqliteLedger::open_memory().unwrap();
        let channel_id = ChannelId::from_bytes([0x77; 32]);
        let err = ledger
            .submit_anchor(&channel_id, &AnchorageId::derive(&channel_id, 1), b"x")
            .await
            .unwrap_err();
        assert!(matches!(err, ChannelError::ChannelNotFound(_)));
    }
}
