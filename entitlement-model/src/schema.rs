use serde_json::Value;

use crate::error::FieldError;

/// The value shape a field accepts.
///
/// Timestamps are whole seconds since the Unix epoch. Enumerations carry
/// their allowed options inline so a field enum can stay `Copy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Text,
    Bool,
    Integer,
    Timestamp,
    Enum(&'static [&'static str]),
}

impl FieldType {
    /// Returns true if `value` has this shape. Null is handled by the caller.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::Text => value.is_string(),
            Self::Bool => value.is_boolean(),
            Self::Integer | Self::Timestamp => value.is_i64() || value.is_u64(),
            Self::Enum(options) => value
                .as_str()
                .is_some_and(|s| options.iter().any(|o| *o == s)),
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Text => "a string".to_string(),
            Self::Bool => "a boolean".to_string(),
            Self::Integer => "an integer".to_string(),
            Self::Timestamp => "a unix timestamp".to_string(),
            Self::Enum(options) => format!("one of [{}]", options.join(", ")),
        }
    }
}

/// A statically-known field of a record type.
///
/// Implemented by the enums [`schema_fields!`](crate::schema_fields) generates;
/// the `Ord` impl follows declaration order.
pub trait FieldKey: Copy + Eq + Ord + std::hash::Hash + std::fmt::Debug + Send + Sync + 'static {
    /// Every field, in declaration order.
    const ALL: &'static [Self];

    /// The persisted name of the field.
    fn name(self) -> &'static str;

    /// The value shape the field accepts.
    fn field_type(self) -> FieldType;

    /// Whether the field accepts null.
    fn nullable(self) -> bool;

    /// Resolves a persisted name back to its field.
    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.name() == name)
    }

    /// Checks `value` against the field's declared shape.
    fn check(self, value: &Value) -> Result<(), FieldError> {
        if value.is_null() {
            return if self.nullable() {
                Ok(())
            } else {
                Err(FieldError::new(self.name(), "null is not allowed"))
            };
        }
        let ty = self.field_type();
        if ty.accepts(value) {
            Ok(())
        } else {
            Err(FieldError::new(
                self.name(),
                format!("expected {}, got {value}", ty.describe()),
            ))
        }
    }
}

/// Describes a record type: its field set, its store namespace, and its defaults.
///
/// Defaults take `&self` so a schema instance can carry context that some
/// defaults depend on (for example the site a license is bound to).
pub trait Schema: Send + Sync {
    type Field: FieldKey;

    /// Namespace used in the store key, e.g. `license`.
    const OBJECT_TYPE: &'static str;

    /// Default value for a field of a freshly constructed record.
    fn default_value(&self, field: Self::Field) -> Value;
}

/// Declares a field enum and its [`FieldKey`] implementation from a table.
///
/// ```
/// use entitlement_model::{schema_fields, FieldKey, FieldType};
///
/// schema_fields! {
///     pub enum NoteField {
///         Title("title"): FieldType::Text,
///         Pinned("pinned"): FieldType::Bool,
///         RemindAt("remind_at", nullable): FieldType::Timestamp,
///     }
/// }
///
/// assert_eq!(NoteField::from_name("remind_at"), Some(NoteField::RemindAt));
/// assert!(NoteField::RemindAt.nullable());
/// ```
#[macro_export]
macro_rules! schema_fields {
    (@nullable nullable) => { true };
    (@nullable) => { false };
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$fmeta:meta])*
                $variant:ident ( $key:literal $(, $nullable:ident)? ) : $ty:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        $vis enum $name {
            $( $(#[$fmeta])* $variant ),+
        }

        impl $crate::FieldKey for $name {
            const ALL: &'static [Self] = &[ $( Self::$variant ),+ ];

            fn name(self) -> &'static str {
                match self {
                    $( Self::$variant => $key ),+
                }
            }

            fn field_type(self) -> $crate::FieldType {
                match self {
                    $( Self::$variant => $ty ),+
                }
            }

            fn nullable(self) -> bool {
                match self {
                    $( Self::$variant => $crate::schema_fields!(@nullable $($nullable)?) ),+
                }
            }
        }
    };
}
