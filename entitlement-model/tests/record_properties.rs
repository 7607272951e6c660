//! Property-based tests for record change tracking.
//!
//! - Reads always reflect the last accepted write.
//! - Commit never changes what reads return.
//! - Save followed by load reproduces the materialized record.

mod common;

use common::{schema, NoteField};
use entitlement_model::{FieldKey, MemoryStore, Record};
use proptest::prelude::*;
use serde_json::{json, Value};

fn write_strategy() -> impl Strategy<Value = (NoteField, Value)> {
    prop_oneof![
        "[a-zA-Z ]{0,20}".prop_map(|s| (NoteField::Title, json!(s))),
        any::<bool>().prop_map(|b| (NoteField::Pinned, json!(b))),
        (0i64..1_000).prop_map(|n| (NoteField::Views, json!(n))),
        prop::sample::select(vec!["low", "normal", "high"])
            .prop_map(|p| (NoteField::Priority, json!(p))),
        prop::option::of(0i64..2_000_000_000)
            .prop_map(|t| (NoteField::RemindAt, t.map_or(Value::Null, |t| json!(t)))),
    ]
}

proptest! {
    #[test]
    fn reads_reflect_last_write(writes in prop::collection::vec(write_strategy(), 0..30)) {
        let mut r = Record::new(schema());
        let mut expected = Record::new(schema()).materialize();
        for (field, value) in writes {
            r.set(field, value.clone()).unwrap();
            expected.insert(field.name().to_string(), value);
        }
        for field in NoteField::ALL {
            let name = field.name();
            prop_assert_eq!(r.get(*field), &expected[name]);
        }
    }

    #[test]
    fn commit_preserves_reads(writes in prop::collection::vec(write_strategy(), 0..30)) {
        let mut r = Record::new(schema());
        for (field, value) in writes {
            r.set(field, value).unwrap();
        }
        let before: Vec<Value> = NoteField::ALL
            .iter()
            .map(|f| r.get(*f).clone())
            .collect();
        r.commit();
        let after: Vec<Value> = NoteField::ALL
            .iter()
            .map(|f| r.get(*f).clone())
            .collect();
        prop_assert_eq!(before, after);
        prop_assert!(!r.is_dirty());
    }

    #[test]
    fn save_load_round_trip(writes in prop::collection::vec(write_strategy(), 0..30)) {
        let store = MemoryStore::new();
        let mut r = Record::with_identity(schema(), "prop");
        for (field, value) in writes {
            r.set(field, value).unwrap();
        }
        r.save(&store).unwrap();
        let loaded = Record::load(schema(), "prop", &store).unwrap();
        prop_assert_eq!(loaded.materialize(), r.materialize());
    }
}
