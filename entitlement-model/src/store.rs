use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::Value;

use crate::error::{ModelError, ModelResult};

/// Keyed storage for whole records.
///
/// Writes replace the entire record under a key; there is no field-level
/// compare-and-set, so the last write wins.
pub trait RecordStore: Send + Sync {
    /// Returns the record under `key`, or `None` if absent.
    fn get(&self, key: &str) -> ModelResult<Option<Value>>;

    /// Stores `record` under `key`, replacing any previous record.
    fn set(&self, key: &str, record: &Value) -> ModelResult<()>;

    /// Removes the record under `key`. Removing an absent key is not an error.
    fn delete(&self, key: &str) -> ModelResult<()>;
}

/// Builds the store key for a record: `{id}_{object_type}`.
pub fn record_key(id: &str, object_type: &str) -> String {
    format!("{id}_{object_type}")
}

/// A process-local store, used for tests and ephemeral hosts.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RecordStore for MemoryStore {
    fn get(&self, key: &str) -> ModelResult<Option<Value>> {
        let records = self.records.lock().map_err(|e| ModelError::Store(e.to_string()))?;
        Ok(records.get(key).cloned())
    }

    fn set(&self, key: &str, record: &Value) -> ModelResult<()> {
        let mut records = self.records.lock().map_err(|e| ModelError::Store(e.to_string()))?;
        records.insert(key.to_string(), record.clone());
        Ok(())
    }

    fn delete(&self, key: &str) -> ModelResult<()> {
        let mut records = self.records.lock().map_err(|e| ModelError::Store(e.to_string()))?;
        records.remove(key);
        Ok(())
    }
}
