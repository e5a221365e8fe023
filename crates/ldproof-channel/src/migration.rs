//! Schema migrations for the SQLite ledger.
//!
//! Migrations are an ordered list of SQL batches. The highest applied
//! version is recorded in `ledger_schema`, and opening a ledger applies
//! whatever is missing in one transaction.

use rusqlite::{params, Connection};
use tracing::info;

use crate::error::{ChannelError, Result};
use crate::memory::now_millis;

/// Versioned SQL batches, oldest first. Versions count up from 1.
const MIGRATIONS: &[(u32, &str)] = &[(1, CHANNELS_AND_ANCHORAGES)];

const CHANNELS_AND_ANCHORAGES: &str = r#"
    -- One row per bound channel
    CREATE TABLE channels (
        channel_id BLOB PRIMARY KEY,      -- 32 bytes, Blake3 of canonical genesis
        node TEXT NOT NULL,
        nonce BLOB NOT NULL,              -- 32 bytes, ledger-chosen
        genesis BLOB NOT NULL,            -- canonical genesis bytes
        created_at INTEGER NOT NULL,      -- Unix ms
        next_index INTEGER NOT NULL DEFAULT 1
    );

    -- Immutable anchorages
    CREATE TABLE anchorages (
        channel_id BLOB NOT NULL,
        idx INTEGER NOT NULL,             -- 1-indexed position
        anchorage_id BLOB NOT NULL UNIQUE,
        payload BLOB NOT NULL,
        previous_anchorage_id BLOB,       -- NULL for idx = 1
        anchored_at INTEGER NOT NULL,

        PRIMARY KEY (channel_id, idx),
        FOREIGN KEY (channel_id) REFERENCES channels(channel_id)
    );
"#;

/// Schema version this build writes.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |(version, _)| *version)
}

/// Highest applied version, 0 for a fresh database.
pub fn schema_version(conn: &Connection) -> Result<u32> {
    let version: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM ledger_schema",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

/// Bring the schema up to [`latest_version`]. Safe to call on every open.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS ledger_schema (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let applied = schema_version(conn)?;
    let latest = latest_version();
    if applied > latest {
        return Err(ChannelError::Migration(format!(
            "database is at schema version {applied}, this build knows up to {latest}"
        )));
    }

    let pending: Vec<_> = MIGRATIONS.iter().filter(|(v, _)| *v > applied).collect();
    if pending.is_empty() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for (version, sql) in pending {
        tx.execute_batch(sql)?;
        tx.execute(
            "INSERT INTO ledger_schema (version, applied_at) VALUES (?1, ?2)",
            params![version, now_millis()],
        )?;
    }
    tx.commit()?;
    info!(from = applied, to = latest, "ledger schema migrated");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrate_is_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        assert_eq!(schema_version(&conn).ok(), None);

        migrate(&mut conn).unwrap();
        migrate(&mut conn).unwrap();
        assert_eq!(schema_version(&conn).unwrap(), latest_version());

        let rows: u32 = conn
            .query_row("SELECT COUNT(*) FROM ledger_schema", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows as usize, MIGRATIONS.len());
    }

    #[test]
    fn test_versions_are_ordered() {
        for (i, (version, _)) in MIGRATIONS.iter().enumerate() {
            assert_eq!(*version as usize, i + 1);
        }
    }

    #[test]
    fn test_unreadable_version_table_is_an_error() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute("CREATE TABLE ledger_schema (applied_at INTEGER)", [])
            .unwrap();

        let err = migrate(&mut conn).unwrap_err();
        assert!(matches!(err, ChannelError::Database(_)));

        // Nothing was applied on top of the broken table.
        let channels: u32 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE name = 'channels'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(channels, 0);
    }

    #[test]
    fn test_newer_schema_is_refused() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();
        conn.execute(
            "INSERT INTO ledger_schema (version, applied_at) VALUES (?1, 0)",
            params![latest_version() + 1],
        )
        .unwrap();

        let err = migrate(&mut conn).unwrap_err();
        assert!(matches!(err, ChannelError::Migration(_)));
    }
}
