//! SQLite storage layer for entitlement records.
//!
//! Provides a durable [`RecordStore`](entitlement_model::RecordStore) for
//! hosts that persist license state across restarts.
//!
//! # Architecture
//!
//! - One `records` table maps a store key (`{id}_{object_type}`) to the
//!   JSON-serialized record
//! - Writes replace the whole row; the last write wins
//! - The connection is shared behind a mutex, so a store can be handed to
//!   concurrent services as an `Arc<dyn RecordStore>`

mod error;
mod sqlite_store;

pub use error::{StorageError, StorageResult};
pub use sqlite_store::SqliteStore;
