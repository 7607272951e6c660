//! Shared test schema for record tests.

#![allow(dead_code)]

use entitlement_model::{schema_fields, FieldType, Schema};
use serde_json::{json, Value};

pub const PRIORITIES: &[&str] = &["low", "normal", "high"];

schema_fields! {
    pub enum NoteField {
        Title("title"): FieldType::Text,
        Pinned("pinned"): FieldType::Bool,
        Views("views"): FieldType::Integer,
        Priority("priority"): FieldType::Enum(PRIORITIES),
        RemindAt("remind_at", nullable): FieldType::Timestamp,
    }
}

#[derive(Debug, Clone, Default)]
pub struct NoteSchema {
    pub default_title: String,
}

impl Schema for NoteSchema {
    type Field = NoteField;

    const OBJECT_TYPE: &'static str = "note";

    fn default_value(&self, field: NoteField) -> Value {
        match field {
            NoteField::Title => json!(self.default_title),
            NoteField::Pinned => json!(false),
            NoteField::Views => json!(0),
            NoteField::Priority => json!("normal"),
            NoteField::RemindAt => Value::Null,
        }
    }
}

pub fn schema() -> NoteSchema {
    NoteSchema {
        default_title: "Untitled".to_string(),
    }
}
