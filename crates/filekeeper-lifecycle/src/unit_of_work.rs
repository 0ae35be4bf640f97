//! Persistence-engine side of the lifecycle hooks.
//!
//! The engine owns the records and their change tracking; the orchestrator only
//! sees them through these traits while a flush is running.

use filekeeper_core::{FieldValue, Record};
use std::collections::BTreeMap;

/// Field-level diff of one record against its last persisted state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    changes: BTreeMap<String, (FieldValue, FieldValue)>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `field` going from `old` to `new`. Equal values are not a change.
    pub fn record_change(&mut self, field: impl Into<String>, old: FieldValue, new: FieldValue) {
        if old != new {
            self.changes.insert(field.into(), (old, new));
        }
    }

    pub fn contains(&self, field: &str) -> bool {
        self.changes.contains_key(field)
    }

    pub fn old_value(&self, field: &str) -> Option<&FieldValue> {
        self.changes.get(field).map(|(old, _)| old)
    }

    pub fn new_value(&self, field: &str) -> Option<&FieldValue> {
        self.changes.get(field).map(|(_, new)| new)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.changes.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

/// A record scheduled for insertion or update, with its pending change set.
pub trait TrackedRecord: Send + Sync {
    fn record(&self) -> &dyn Record;

    fn record_mut(&mut self) -> &mut dyn Record;

    fn change_set(&self) -> &ChangeSet;

    /// Re-diff the record after the lifecycle layer rewrote some of its fields.
    fn recompute_change_set(&mut self);
}

/// The engine's view of one flush.
pub trait UnitOfWork: Send {
    /// Every record the flush may touch: scheduled insertions first, then the
    /// remaining managed records. Each record appears once.
    fn tracked_records(&mut self) -> Vec<&mut dyn Record>;

    fn scheduled_insertions(&mut self) -> Vec<&mut dyn TrackedRecord>;

    fn scheduled_updates(&mut self) -> Vec<&mut dyn TrackedRecord>;

    fn scheduled_deletions(&self) -> Vec<&dyn Record>;
}
