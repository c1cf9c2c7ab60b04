//! SQLite-backed single-row snapshot store.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::{Connection, OptionalExtension, params};

use crate::core::session::Session;

use super::{PersistError, PersistResult, SnapshotStore};

const SNAPSHOT_FORMAT_VERSION: u16 = 1;

/// SQLite implementation of [`crate::persist::SnapshotStore`].
///
/// Keeps exactly one row; each save replaces it in a single statement.
pub struct SqliteSnapshotStore {
    conn: Connection,
}

impl SqliteSnapshotStore {
    /// Opens or creates a SQLite-backed store at `path`.
    ///
    /// Enables WAL mode and sets `synchronous=NORMAL`.
    pub fn open(path: impl AsRef<Path>) -> PersistResult<Self> {
        let conn = Connection::open(path)?;
        Self::init_connection(conn)
    }

    /// Opens an in-memory SQLite store.
    pub fn open_in_memory() -> PersistResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_connection(conn)
    }

    fn init_connection(conn: Connection) -> PersistResult<Self> {
        conn.execute_batch(include_str!("schema.sql"))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        Ok(Self { conn })
    }

    /// Timestamp of the stored snapshot in milliseconds, if any.
    pub fn saved_at_ms(&self) -> PersistResult<Option<u64>> {
        let ts: Option<i64> = self
            .conn
            .query_row("SELECT ts_ms FROM session_snapshot WHERE id = 1", [], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(ts.map(|v| v as u64))
    }
}

impl SnapshotStore for SqliteSnapshotStore {
    fn load(&self) -> PersistResult<Option<Session>> {
        let row: Option<(u16, Vec<u8>)> = self
            .conn
            .query_row(
                "SELECT format_version, payload FROM session_snapshot WHERE id = 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((format_version, payload)) = row else {
            return Ok(None);
        };

        if format_version != SNAPSHOT_FORMAT_VERSION {
            return Err(PersistError::Message(format!(
                "unsupported snapshot format version: {format_version}"
            )));
        }
        Ok(Some(serde_json::from_slice(&payload)?))
    }

    fn save(&mut self, session: &Session) -> PersistResult<()> {
        let payload = serde_json::to_vec(session)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO session_snapshot(id, format_version, ts_ms, payload) VALUES (1, ?1, ?2, ?3)",
            params![SNAPSHOT_FORMAT_VERSION, now_ms() as i64, payload],
        )?;
        Ok(())
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
