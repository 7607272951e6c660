use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{FieldError, ModelError, ModelResult};
use crate::schema::{FieldKey, Schema};
use crate::store::{record_key, RecordStore};

static NULL: Value = Value::Null;

/// A persisted record with deferred-write change tracking.
///
/// Reads see the pending value of a field if one exists, otherwise the
/// baseline. Writes made while the record is loaded are staged in `pending`
/// and only reach the baseline on [`commit`](Self::commit). Writes made while
/// the record is not loaded (initial population) go straight to the baseline.
#[derive(Debug, Clone)]
pub struct Record<S: Schema> {
    schema: S,
    id: String,
    baseline: BTreeMap<S::Field, Value>,
    pending: BTreeMap<S::Field, Value>,
    loaded: bool,
}

impl<S: Schema> Record<S> {
    /// Creates a record populated with schema defaults and no identity.
    pub fn new(schema: S) -> Self {
        Self::with_identity(schema, "")
    }

    /// Creates a record populated with schema defaults under `id`.
    pub fn with_identity(schema: S, id: impl Into<String>) -> Self {
        let baseline = defaults(&schema);
        Self {
            schema,
            id: id.into(),
            baseline,
            pending: BTreeMap::new(),
            loaded: true,
        }
    }

    /// Creates a record under `id` from a field map, as if it had been read.
    ///
    /// Rejected or unknown fields are skipped; the remaining fields still apply.
    pub fn from_fields(schema: S, id: impl Into<String>, fields: &Map<String, Value>) -> Self {
        let mut record = Self::with_identity(schema, id);
        record.populate(fields);
        record
    }

    /// Loads the record stored under `id`, or a default record if none exists.
    pub fn load(schema: S, id: impl Into<String>, store: &dyn RecordStore) -> ModelResult<Self> {
        let mut record = Self::with_identity(schema, id);
        if let Some(fields) = record.fetch(store)? {
            record.populate(&fields);
        }
        Ok(record)
    }

    pub fn schema(&self) -> &S {
        &self.schema
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn object_type(&self) -> &'static str {
        S::OBJECT_TYPE
    }

    /// The key this record persists under.
    pub fn store_key(&self) -> String {
        record_key(&self.id, S::OBJECT_TYPE)
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Switches between initialization (writes hit the baseline) and
    /// tracked mode (writes are staged).
    pub fn mark_loaded(&mut self, loaded: bool) -> &mut Self {
        self.loaded = loaded;
        self
    }

    /// Returns the current value of a field.
    pub fn get(&self, field: S::Field) -> &Value {
        self.pending
            .get(&field)
            .or_else(|| self.baseline.get(&field))
            .unwrap_or(&NULL)
    }

    /// Returns the current value of a field by its persisted name.
    /// Unknown names are absent, not an error.
    pub fn get_named(&self, name: &str) -> Option<&Value> {
        S::Field::from_name(name).map(|field| self.get(field))
    }

    /// Writes a field.
    ///
    /// While loaded, a pending change is only recorded if the value differs
    /// from the baseline or the field already has a pending change.
    pub fn set(&mut self, field: S::Field, value: impl Into<Value>) -> Result<(), FieldError> {
        let value = value.into();
        field.check(&value)?;

        if !self.loaded {
            self.baseline.insert(field, value);
            return Ok(());
        }

        if self.pending.contains_key(&field) || self.baseline.get(&field) != Some(&value) {
            self.pending.insert(field, value);
        }
        Ok(())
    }

    /// Writes a field as a pending change even if it matches the baseline,
    /// so the write outlives a later [`sync_baseline`](Self::sync_baseline).
    pub fn stage(&mut self, field: S::Field, value: impl Into<Value>) -> Result<(), FieldError> {
        let value = value.into();
        field.check(&value)?;
        if self.loaded {
            self.pending.insert(field, value);
        } else {
            self.baseline.insert(field, value);
        }
        Ok(())
    }

    /// Writes a field by its persisted name. Unknown names are a no-op.
    pub fn set_named(&mut self, name: &str, value: impl Into<Value>) -> Result<(), FieldError> {
        match S::Field::from_name(name) {
            Some(field) => self.set(field, value),
            None => Ok(()),
        }
    }

    /// Writes every field in `fields`, collecting the rejected ones.
    ///
    /// A rejected field does not stop the remaining writes.
    pub fn set_many<I, V>(&mut self, fields: I) -> Vec<FieldError>
    where
        I: IntoIterator<Item = (S::Field, V)>,
        V: Into<Value>,
    {
        fields
            .into_iter()
            .filter_map(|(field, value)| self.set(field, value).err())
            .collect()
    }

    /// Writes every known field of a name-keyed map, collecting the rejected ones.
    pub fn set_many_named(&mut self, fields: &Map<String, Value>) -> Vec<FieldError> {
        fields
            .iter()
            .filter_map(|(name, value)| self.set_named(name, value.clone()).err())
            .collect()
    }

    /// Like [`set_many`](Self::set_many), but folds failures into a single error.
    pub fn apply<I, V>(&mut self, fields: I) -> ModelResult<()>
    where
        I: IntoIterator<Item = (S::Field, V)>,
        V: Into<Value>,
    {
        let failures = self.set_many(fields);
        if failures.is_empty() {
            Ok(())
        } else {
            Err(ModelError::Persistence(failures))
        }
    }

    /// Returns true if there are uncommitted changes.
    pub fn is_dirty(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Uncommitted changes, keyed by field.
    pub fn pending(&self) -> &BTreeMap<S::Field, Value> {
        &self.pending
    }

    /// Merges pending changes into the baseline.
    pub fn commit(&mut self) -> &mut Self {
        for (field, value) in std::mem::take(&mut self.pending) {
            match self.baseline.get_mut(&field) {
                Some(current) => deep_merge(current, value),
                None => {
                    self.baseline.insert(field, value);
                }
            }
        }
        self
    }

    /// Drops pending changes and restores every field to its default.
    ///
    /// The record is left unloaded, so following writes are initialization.
    pub fn reset_to_defaults(&mut self) -> &mut Self {
        self.baseline = defaults(&self.schema);
        self.pending.clear();
        self.loaded = false;
        self
    }

    /// The committed state as a name-keyed map, with the identity under `id`.
    pub fn materialize(&self) -> Map<String, Value> {
        let mut data = Map::with_capacity(self.baseline.len() + 1);
        data.insert("id".to_string(), Value::String(self.id.clone()));
        for (field, value) in &self.baseline {
            data.insert(field.name().to_string(), value.clone());
        }
        data
    }

    /// Commits pending changes and writes the whole record to the store.
    pub fn save(&mut self, store: &dyn RecordStore) -> ModelResult<()> {
        if self.id.is_empty() {
            return Err(ModelError::MissingIdentity(S::OBJECT_TYPE));
        }
        self.commit();
        store.set(&self.store_key(), &Value::Object(self.materialize()))
    }

    /// Like [`save`](Self::save), assigning `id` first if the record has no
    /// identity yet. An assigned identity never changes.
    pub fn save_as(&mut self, id: &str, store: &dyn RecordStore) -> ModelResult<()> {
        if self.id.is_empty() {
            self.id = id.to_string();
        } else if self.id != id {
            return Err(ModelError::IdentityChange {
                current: self.id.clone(),
                requested: id.to_string(),
            });
        }
        self.save(store)
    }

    /// Resets the record to defaults and removes it from the store.
    ///
    /// A deleted record behaves like a freshly constructed one.
    pub fn delete(&mut self, store: &dyn RecordStore) -> ModelResult<()> {
        self.reset_to_defaults();
        self.loaded = true;
        store.delete(&self.store_key())
    }

    /// Replaces the baseline with the persisted record, keeping pending writes.
    ///
    /// Returns false if nothing is stored under this record's key, in which
    /// case the baseline falls back to schema defaults. A record without
    /// identity is left untouched.
    pub fn sync_baseline(&mut self, store: &dyn RecordStore) -> ModelResult<bool> {
        if self.id.is_empty() {
            return Ok(false);
        }
        let fields = self.fetch(store)?;
        let pending = std::mem::take(&mut self.pending);
        self.baseline = defaults(&self.schema);
        let found = match fields {
            Some(fields) => {
                self.populate(&fields);
                true
            }
            None => false,
        };
        self.pending = pending;
        self.loaded = true;
        Ok(found)
    }

    fn fetch(&self, store: &dyn RecordStore) -> ModelResult<Option<Map<String, Value>>> {
        if self.id.is_empty() {
            return Ok(None);
        }
        let key = self.store_key();
        match store.get(&key)? {
            None => Ok(None),
            Some(Value::Object(fields)) => Ok(Some(fields)),
            Some(_) => Err(ModelError::Corrupt(key)),
        }
    }

    fn populate(&mut self, fields: &Map<String, Value>) {
        self.loaded = false;
        for failure in self.set_many_named(fields) {
            warn!(
                object_type = S::OBJECT_TYPE,
                id = %self.id,
                field = failure.field,
                "skipping persisted field: {}",
                failure.reason
            );
        }
        self.loaded = true;
    }
}

fn defaults<S: Schema>(schema: &S) -> BTreeMap<S::Field, Value> {
    S::Field::ALL
        .iter()
        .map(|&field| (field, schema.default_value(field)))
        .collect()
}

/// Recursively merges objects; any other value replaces the target.
fn deep_merge(target: &mut Value, patch: Value) {
    match (target, patch) {
        (Value::Object(target), Value::Object(patch)) => {
            for (key, value) in patch {
                match target.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        target.insert(key, value);
                    }
                }
            }
        }
        (target, patch) => *target = patch,
    }
}
