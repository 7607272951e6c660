use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use entitlement_model::{ModelResult, RecordStore};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use tracing::debug;

use crate::error::{StorageError, StorageResult};

/// Persistent record store backed by SQLite.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Opens (or creates) a store at the given path.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let conn = Connection::open(path.as_ref())?;
        debug!(path = %path.as_ref().display(), "opened record store");
        Self::with_connection(conn)
    }

    /// Opens an in-memory store (for testing).
    pub fn open_in_memory() -> StorageResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> StorageResult<Self> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS records (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );
            ",
        )?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::Poisoned)
    }

    /// Reads the record under `key`.
    pub fn read(&self, key: &str) -> StorageResult<Option<Value>> {
        let conn = self.lock()?;
        let raw: Option<String> = conn
            .query_row(
                "SELECT value FROM records WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        raw.map(|s| serde_json::from_str(&s))
            .transpose()
            .map_err(Into::into)
    }

    /// Writes the record under `key`, replacing any previous one.
    pub fn write(&self, key: &str, record: &Value) -> StorageResult<()> {
        let raw = serde_json::to_string(record)?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO records (key, value, updated_at) VALUES (?1, ?2, ?3)",
            params![key, raw, chrono::Utc::now().timestamp_millis()],
        )?;
        debug!(key, "record written");
        Ok(())
    }

    /// Removes the record under `key`.
    pub fn remove(&self, key: &str) -> StorageResult<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM records WHERE key = ?1", params![key])?;
        debug!(key, "record removed");
        Ok(())
    }

    /// Returns every stored key, sorted.
    pub fn keys(&self) -> StorageResult<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT key FROM records ORDER BY key")?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(keys)
    }

    /// Milliseconds since the epoch of the last write to `key`.
    pub fn updated_at(&self, key: &str) -> StorageResult<Option<i64>> {
        let conn = self.lock()?;
        let ts = conn
            .query_row(
                "SELECT updated_at FROM records WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(ts)
    }
}

impl RecordStore for SqliteStore {
    fn get(&self, key: &str) -> ModelResult<Option<Value>> {
        Ok(self.read(key)?)
    }

    fn set(&self, key: &str, record: &Value) -> ModelResult<()> {
        Ok(self.write(key, record)?)
    }

    fn delete(&self, key: &str) -> ModelResult<()> {
        Ok(self.remove(key)?)
    }
}
