//! SQLite-backed key/value snapshot sink.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::{Connection, OptionalExtension, params};

use crate::{
    core::store::{QaStore, StoreSnapshotV1},
    types::Generation,
};

use super::{CollectionKey, PersistResult, StateSink};

/// SQLite implementation of [`StateSink`].
///
/// One `kv` table holds the three collection payloads under their fixed
/// keys. Concurrent use of one database from several processes is
/// unsynchronized last-write-wins, same as the key/value medium it models.
pub struct SqliteStateSink {
    conn: Connection,
}

impl SqliteStateSink {
    /// Opens or creates a SQLite-backed sink at `path`.
    ///
    /// Enables WAL mode and sets `synchronous=NORMAL`.
    pub fn open(path: impl AsRef<Path>) -> PersistResult<Self> {
        let conn = Connection::open(path)?;
        Self::init_connection(conn)
    }

    /// Opens an in-memory SQLite sink.
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

    /// Rebuilds a store from the persisted collections.
    ///
    /// Missing keys load as empty collections; derived counters are
    /// normalized by [`QaStore::from_snapshot`].
    pub fn load_store(&self) -> PersistResult<QaStore> {
        let mut snapshot = StoreSnapshotV1::default();

        if let Some(payload) = self.read_collection(CollectionKey::Questions)? {
            snapshot.questions = serde_json::from_slice(&payload)?;
        }
        if let Some(payload) = self.read_collection(CollectionKey::Replies)? {
            snapshot.replies = serde_json::from_slice(&payload)?;
        }
        if let Some(payload) = self.read_collection(CollectionKey::Notifications)? {
            snapshot.notifications = serde_json::from_slice(&payload)?;
        }

        Ok(QaStore::from_snapshot(snapshot))
    }

    /// Reads the raw payload stored under `key`.
    pub fn read_collection(&self, key: CollectionKey) -> PersistResult<Option<Vec<u8>>> {
        let payload: Option<Vec<u8>> = self
            .conn
            .query_row(
                "SELECT payload FROM kv WHERE key = ?1",
                params![key.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(payload)
    }

    /// Highest generation recorded across all keys.
    pub fn latest_generation(&self) -> PersistResult<Generation> {
        let generation: Option<i64> = self
            .conn
            .query_row("SELECT MAX(generation) FROM kv", [], |row| row.get(0))
            .optional()?
            .flatten();
        Ok(generation.unwrap_or(0) as Generation)
    }

    /// Writes a full snapshot, all three keys in one transaction.
    pub fn write_snapshot(
        &mut self,
        snapshot: &StoreSnapshotV1,
        generation: Generation,
    ) -> PersistResult<()> {
        let questions = serde_json::to_vec(&snapshot.questions)?;
        let replies = serde_json::to_vec(&snapshot.replies)?;
        let notifications = serde_json::to_vec(&snapshot.notifications)?;

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO kv(key, generation, ts_ms, payload) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(key) DO UPDATE
                 SET generation = excluded.generation,
                     ts_ms = excluded.ts_ms,
                     payload = excluded.payload",
            )?;
            for (key, payload) in [
                (CollectionKey::Questions, &questions),
                (CollectionKey::Replies, &replies),
                (CollectionKey::Notifications, &notifications),
            ] {
                stmt.execute(params![
                    key.as_str(),
                    generation as i64,
                    now_ms() as i64,
                    payload
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}

impl StateSink for SqliteStateSink {
    fn write_collection(
        &mut self,
        key: CollectionKey,
        payload: &[u8],
        generation: Generation,
    ) -> PersistResult<()> {
        self.conn.execute(
            "INSERT INTO kv(key, generation, ts_ms, payload) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(key) DO UPDATE
             SET generation = excluded.generation,
                 ts_ms = excluded.ts_ms,
                 payload = excluded.payload",
            params![key.as_str(), generation as i64, now_ms() as i64, payload],
        )?;
        Ok(())
    }

    fn flush(&mut self) -> PersistResult<()> {
        self.conn.execute_batch("PRAGMA wal_checkpoint(PASSIVE);")?;
        Ok(())
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
