//! Boundary with the persistence engine: generic field access on tracked records and
//! the per-type configuration lookup.

use std::sync::Arc;

use crate::models::configuration::UploadableConfiguration;
use crate::models::file::FileRef;

/// Value read from or written to a record field.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FieldValue {
    #[default]
    Null,
    Text(String),
    File(FileRef),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_file(&self) -> Option<&FileRef> {
        match self {
            FieldValue::File(file) => Some(file),
            _ => None,
        }
    }
}

impl From<Option<String>> for FieldValue {
    fn from(value: Option<String>) -> Self {
        value.map(FieldValue::Text).unwrap_or(FieldValue::Null)
    }
}

impl From<Option<FileRef>> for FieldValue {
    fn from(value: Option<FileRef>) -> Self {
        value.map(FieldValue::File).unwrap_or(FieldValue::Null)
    }
}

/// A persistent record as seen by the lifecycle layer.
///
/// Implemented by the persistence engine (or by the application's entity types).
/// Unknown fields read as [`FieldValue::Null`].
pub trait Record: Send + Sync {
    /// Stable name of the record's type, used as the configuration and cache key.
    fn record_type(&self) -> &str;

    fn field_value(&self, field: &str) -> FieldValue;

    fn set_field_value(&mut self, field: &str, value: FieldValue);
}

/// Per-type upload metadata lookup. `None` means the type is not uploadable.
pub trait MetadataProvider: Send + Sync {
    fn configuration(&self, record_type: &str) -> Option<Arc<UploadableConfiguration>>;
}
