//! Operator notices.
//!
//! Persistent notices are stored through the record store under
//! `{notice_id}_notice` and stay until dismissed.

use std::fmt;
use std::sync::Arc;

use entitlement_model::{record_key, ModelResult, RecordStore};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ServiceError;

const OBJECT_TYPE: &str = "notice";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Success,
    Error,
}

/// A message for the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub id: String,
    pub kind: NoticeKind,
    pub message: String,
    /// Kept across restarts until dismissed.
    pub persistent: bool,
    pub dismissible: bool,
}

impl Notice {
    pub fn success(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: NoticeKind::Success,
            message: message.into(),
            persistent: false,
            dismissible: true,
        }
    }

    pub fn error(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: NoticeKind::Error,
            message: message.into(),
            persistent: false,
            dismissible: true,
        }
    }

    /// A persistent, non-dismissible error naming `product`.
    pub fn license_invalid(id: impl Into<String>, product: &str, err: &ServiceError) -> Self {
        Self {
            persistent: true,
            dismissible: false,
            ..Self::error(id, format!("{product}: {}", err.message))
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == NoticeKind::Error
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Stores persistent notices.
pub struct NoticeBoard {
    store: Arc<dyn RecordStore>,
}

impl fmt::Debug for NoticeBoard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NoticeBoard").finish_non_exhaustive()
    }
}

impl NoticeBoard {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Saves a notice, replacing any notice with the same id.
    pub fn post(&self, notice: &Notice) -> ModelResult<()> {
        let value = serde_json::to_value(notice)?;
        self.store.set(&record_key(&notice.id, OBJECT_TYPE), &value)
    }

    pub fn get(&self, id: &str) -> ModelResult<Option<Notice>> {
        match self.store.get(&record_key(id, OBJECT_TYPE))? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    pub fn dismiss(&self, id: &str) -> ModelResult<()> {
        self.store.delete(&record_key(id, OBJECT_TYPE))
    }

    /// Like [`post`](Self::post), logging instead of failing.
    pub fn raise(&self, notice: &Notice) {
        if let Err(e) = self.post(notice) {
            warn!(notice = %notice.id, error = %e, "failed to save notice: {}", notice.message);
        }
    }
}
