/// SQLite implementation of the key/value medium.
pub mod sqlite;

use crate::types::Generation;

/// Fixed keys of the three persisted collections.
///
/// Each collection is stored independently as one JSON array under its key,
/// matching the per-origin key/value layout the application always used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKey {
    /// The questions array.
    Questions,
    /// The replies array.
    Replies,
    /// The notifications array.
    Notifications,
}

impl CollectionKey {
    /// All keys, in canonical order.
    pub const ALL: [CollectionKey; 3] = [
        CollectionKey::Questions,
        CollectionKey::Replies,
        CollectionKey::Notifications,
    ];

    /// The storage key string.
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionKey::Questions => "askseniors-questions",
            CollectionKey::Replies => "askseniors-replies",
            CollectionKey::Notifications => "askseniors-notifications",
        }
    }
}

/// Persistence failure modes.
#[derive(Debug)]
pub enum PersistError {
    /// SQLite-level failure.
    Sqlite(rusqlite::Error),
    /// JSON encode/decode failure.
    Serde(serde_json::Error),
    /// Anything else.
    Message(String),
}

impl From<rusqlite::Error> for PersistError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<serde_json::Error> for PersistError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serde(value)
    }
}

/// Result alias for persistence operations.
pub type PersistResult<T> = Result<T, PersistError>;

/// Write side of the persisted key/value medium.
///
/// Writes are full-collection snapshots: the payload under a key is always
/// the complete serialized array, so the latest write per key wins.
pub trait StateSink: Send {
    /// Replaces the payload stored under `key`.
    fn write_collection(
        &mut self,
        key: CollectionKey,
        payload: &[u8],
        generation: Generation,
    ) -> PersistResult<()>;

    /// Forces buffered writes to the medium.
    fn flush(&mut self) -> PersistResult<()> {
        Ok(())
    }
}
