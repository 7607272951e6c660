//! Change-tracked entity records.
//!
//! Defines the generic persisted-state types the license layer is built on:
//! - [`Record`] - a record with schema defaults, deferred writes, and commit
//! - [`Schema`] / [`FieldKey`] - the statically-known field set of a record type
//! - [`FieldType`] - the value shape each field accepts
//! - [`RecordStore`] - the keyed get/set/delete backend records persist through
//!
//! Field sets are declared once with [`schema_fields!`], which generates a
//! field enum so accessors are checked at compile time. String field names
//! are only accepted at the deserialization boundary (loading a persisted
//! record, applying a remote payload), where unknown names are ignored.

mod error;
mod record;
mod schema;
mod store;

pub use error::{FieldError, ModelError, ModelResult};
pub use record::Record;
pub use schema::{FieldKey, FieldType, Schema};
pub use store::{record_key, MemoryStore, RecordStore};
