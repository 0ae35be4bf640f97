//! Test helpers: an in-memory persistence engine driving the lifecycle hooks.
//!
//! Run from workspace root: `cargo test -p filekeeper-lifecycle --test lifecycle_test`.

#![allow(dead_code)]

use async_trait::async_trait;
use filekeeper_core::{
    Behaviour, EventDispatcher, FieldValue, FileEvent, FileResult, MetadataProvider,
    PendingFile, Record, UploadableConfiguration,
};
use filekeeper_lifecycle::{
    ChangeSet, CleanupReport, Handler, LifecycleOrchestrator, TrackedRecord, UnitOfWork,
};
use filekeeper_storage::{LocalStorage, NamingStrategyFactory, StorageResolver};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub const DOCUMENT: &str = "document";
pub const KEPT_DOCUMENT: &str = "kept_document";
pub const ARCHIVED_DOCUMENT: &str = "archived_document";
pub const PHOTO: &str = "photo";
pub const AUDIT_LOG: &str = "audit_log";
/// Uploadable type bound to a storage that is not registered.
pub const OFFLINE_DOCUMENT: &str = "offline_document";

/// A record as a bag of fields.
#[derive(Debug, Clone)]
pub struct TestRecord {
    record_type: String,
    fields: HashMap<String, FieldValue>,
}

impl TestRecord {
    pub fn new(record_type: &str) -> Self {
        Self {
            record_type: record_type.to_string(),
            fields: HashMap::new(),
        }
    }

    pub fn with(mut self, field: &str, value: FieldValue) -> Self {
        self.fields.insert(field.to_string(), value);
        self
    }

    pub fn text(&self, field: &str) -> Option<String> {
        self.field_value(field).as_text().map(String::from)
    }

    /// Columns the engine would write: everything except in-memory file values.
    fn persisted(&self) -> HashMap<String, FieldValue> {
        self.fields
            .iter()
            .filter(|(_, value)| value.as_file().is_none())
            .map(|(field, value)| (field.clone(), value.clone()))
            .collect()
    }
}

impl Record for TestRecord {
    fn record_type(&self) -> &str {
        &self.record_type
    }

    fn field_value(&self, field: &str) -> FieldValue {
        self.fields.get(field).cloned().unwrap_or_default()
    }

    fn set_field_value(&mut self, field: &str, value: FieldValue) {
        self.fields.insert(field.to_string(), value);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    New,
    Managed,
    Removed,
}

struct Entry {
    record: TestRecord,
    snapshot: HashMap<String, FieldValue>,
    state: State,
    change_set: ChangeSet,
}

impl Entry {
    fn diff(&self) -> ChangeSet {
        let current = self.record.persisted();
        let fields: BTreeSet<&String> = current.keys().chain(self.snapshot.keys()).collect();

        let mut change_set = ChangeSet::new();
        for field in fields {
            change_set.record_change(
                field.as_str(),
                self.snapshot.get(field).cloned().unwrap_or_default(),
                current.get(field).cloned().unwrap_or_default(),
            );
        }
        change_set
    }
}

impl TrackedRecord for Entry {
    fn record(&self) -> &dyn Record {
        &self.record
    }

    fn record_mut(&mut self) -> &mut dyn Record {
        &mut self.record
    }

    fn change_set(&self) -> &ChangeSet {
        &self.change_set
    }

    fn recompute_change_set(&mut self) {
        self.change_set = self.diff();
    }
}

/// Identity map plus insert / update / delete scheduling.
#[derive(Default)]
pub struct InMemoryUnitOfWork {
    entries: Vec<Entry>,
}

impl InMemoryUnitOfWork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a new record for insertion. Returns its handle.
    pub fn persist(&mut self, record: TestRecord) -> usize {
        self.entries.push(Entry {
            record,
            snapshot: HashMap::new(),
            state: State::New,
            change_set: ChangeSet::new(),
        });
        self.entries.len() - 1
    }

    /// Register an already-stored record, as after a load.
    pub fn manage(&mut self, record: TestRecord) -> usize {
        let snapshot = record.persisted();
        self.entries.push(Entry {
            record,
            snapshot,
            state: State::Managed,
            change_set: ChangeSet::new(),
        });
        self.entries.len() - 1
    }

    pub fn remove(&mut self, handle: usize) {
        self.entries[handle].state = State::Removed;
    }

    pub fn get(&self, handle: usize) -> &TestRecord {
        &self.entries[handle].record
    }

    pub fn get_mut(&mut self, handle: usize) -> &mut TestRecord {
        &mut self.entries[handle].record
    }

    pub fn compute_change_sets(&mut self) {
        for entry in self.entries.iter_mut() {
            entry.change_set = entry.diff();
        }
    }

    pub fn commit(&mut self) {
        for entry in self.entries.iter_mut() {
            match entry.state {
                State::New | State::Managed => {
                    entry.snapshot = entry.record.persisted();
                    entry.state = State::Managed;
                    entry.change_set = ChangeSet::new();
                }
                State::Removed => {}
            }
        }
    }
}

impl UnitOfWork for InMemoryUnitOfWork {
    fn tracked_records(&mut self) -> Vec<&mut dyn Record> {
        let mut entries: Vec<&mut Entry> = self
            .entries
            .iter_mut()
            .filter(|entry| entry.state != State::Removed)
            .collect();
        entries.sort_by_key(|entry| entry.state != State::New);
        entries
            .into_iter()
            .map(|entry| &mut entry.record as &mut dyn Record)
            .collect()
    }

    fn scheduled_insertions(&mut self) -> Vec<&mut dyn TrackedRecord> {
        self.entries
            .iter_mut()
            .filter(|entry| entry.state == State::New)
            .map(|entry| entry as &mut dyn TrackedRecord)
            .collect()
    }

    fn scheduled_updates(&mut self) -> Vec<&mut dyn TrackedRecord> {
        self.entries
            .iter_mut()
            .filter(|entry| entry.state == State::Managed && !entry.change_set.is_empty())
            .map(|entry| entry as &mut dyn TrackedRecord)
            .collect()
    }

    fn scheduled_deletions(&self) -> Vec<&dyn Record> {
        self.entries
            .iter()
            .filter(|entry| entry.state == State::Removed)
            .map(|entry| &entry.record as &dyn Record)
            .collect()
    }
}

/// Fixed per-type configurations; counts lookups.
pub struct StaticMetadata {
    configs: HashMap<String, Arc<UploadableConfiguration>>,
    lookups: AtomicUsize,
}

impl StaticMetadata {
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl MetadataProvider for StaticMetadata {
    fn configuration(&self, record_type: &str) -> Option<Arc<UploadableConfiguration>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.configs.get(record_type).cloned()
    }
}

fn document_config(behaviour: Behaviour) -> Arc<UploadableConfiguration> {
    Arc::new(
        UploadableConfiguration::builder()
            .prefix("docs")
            .behaviour(behaviour)
            .map_field("file", "file_path")
            .build()
            .expect("valid document configuration"),
    )
}

pub fn test_metadata() -> StaticMetadata {
    let mut configs = HashMap::new();
    configs.insert(DOCUMENT.to_string(), document_config(Behaviour::Remove));
    configs.insert(KEPT_DOCUMENT.to_string(), document_config(Behaviour::Keep));
    configs.insert(ARCHIVED_DOCUMENT.to_string(), document_config(Behaviour::Archive));
    configs.insert(
        PHOTO.to_string(),
        Arc::new(
            UploadableConfiguration::builder()
                .prefix("photos")
                .naming_strategy("origin")
                .map_field("image", "image_path")
                .map_field("thumbnail", "thumbnail_path")
                .build()
                .expect("valid photo configuration"),
        ),
    );

    configs.insert(
        OFFLINE_DOCUMENT.to_string(),
        Arc::new(
            UploadableConfiguration::builder()
                .prefix("docs")
                .storage("offline")
                .map_field("file", "file_path")
                .build()
                .expect("valid offline configuration"),
        ),
    );

    StaticMetadata {
        configs,
        lookups: AtomicUsize::new(0),
    }
}

/// Records event names with their field or relative path.
#[derive(Default)]
pub struct CollectingDispatcher {
    events: Mutex<Vec<String>>,
}

impl CollectingDispatcher {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().expect("dispatcher lock").clone()
    }
}

#[async_trait]
impl EventDispatcher for CollectingDispatcher {
    async fn dispatch(&self, event: FileEvent<'_>) {
        let detail = match &event {
            FileEvent::PreUpload { field, .. } | FileEvent::PostUpload { field, .. } => {
                field.to_string()
            }
            FileEvent::PreRemove(removed) | FileEvent::PostRemove(removed) => {
                removed.relative_path.clone()
            }
        };
        self.events
            .lock()
            .expect("dispatcher lock")
            .push(format!("{}:{}", event.name(), detail));
    }
}

/// Storage root, upload staging and archive directories plus a wired orchestrator.
pub struct TestContext {
    pub root: TempDir,
    pub incoming: TempDir,
    pub archive: TempDir,
    pub metadata: Arc<StaticMetadata>,
    pub dispatcher: Arc<CollectingDispatcher>,
    pub orchestrator: LifecycleOrchestrator,
}

impl TestContext {
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("Failed to create storage root");
        let incoming = tempfile::tempdir().expect("Failed to create incoming dir");
        let archive = tempfile::tempdir().expect("Failed to create archive dir");

        let mut resolver = StorageResolver::new();
        resolver
            .add(
                "default",
                Arc::new(LocalStorage::new(
                    root.path().to_string_lossy(),
                    Some("/uploads".to_string()),
                )),
            )
            .expect("register default storage");

        let dispatcher = Arc::new(CollectingDispatcher::default());
        let handler = Handler::new(
            resolver,
            dispatcher.clone(),
            Arc::new(NamingStrategyFactory::new()),
            archive.path(),
        );

        let metadata = Arc::new(test_metadata());
        let orchestrator = LifecycleOrchestrator::new(Arc::new(handler), metadata.clone());

        Self {
            root,
            incoming,
            archive,
            metadata,
            dispatcher,
            orchestrator,
        }
    }

    /// Write `content` to a fresh upload file named `name`.
    pub fn pending_file(&self, name: &str, content: &[u8]) -> PendingFile {
        static UPLOADS: AtomicUsize = AtomicUsize::new(0);

        let dir = self
            .incoming
            .path()
            .join(UPLOADS.fetch_add(1, Ordering::SeqCst).to_string());
        std::fs::create_dir_all(&dir).expect("Failed to create upload dir");
        let path = dir.join(name);
        std::fs::write(&path, content).expect("Failed to write upload");
        PendingFile::new(path)
    }

    pub fn stored(&self, relative_path: &str) -> PathBuf {
        self.root.path().join(relative_path.trim_start_matches('/'))
    }

    pub fn archived(&self, relative_path: &str) -> PathBuf {
        self.archive.path().join(relative_path.trim_start_matches('/'))
    }

    /// Place a file directly in storage, as if uploaded earlier.
    pub fn seed(&self, relative_path: &str, content: &[u8]) {
        let path = self.stored(relative_path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create storage dir");
        }
        std::fs::write(path, content).expect("Failed to seed file");
    }

    /// Load a stored record into `uow` through the load hook.
    pub async fn load(&self, uow: &mut InMemoryUnitOfWork, mut record: TestRecord) -> usize {
        self.orchestrator
            .on_load(&mut record)
            .await
            .expect("load hook failed");
        uow.manage(record)
    }

    /// Pre-flush, diff, flush. Stops before the commit.
    pub async fn flush(&self, uow: &mut InMemoryUnitOfWork) -> FileResult<()> {
        self.orchestrator.on_pre_flush(uow).await?;
        uow.compute_change_sets();
        self.orchestrator.on_flush(uow).await
    }

    /// Full transaction: flush, commit, post-commit cleanup.
    pub async fn flush_and_commit(&self, uow: &mut InMemoryUnitOfWork) -> FileResult<CleanupReport> {
        self.flush(uow).await?;
        uow.commit();
        Ok(self.orchestrator.on_post_commit().await)
    }
}

pub fn exists(path: &Path) -> bool {
    path.is_file()
}

/// `/{prefix}/` + 32 lowercase hex chars + `.{ext}`.
pub fn is_hashed_path(path: &str, prefix: &str, ext: &str) -> bool {
    let rest = match path.strip_prefix(&format!("/{}/", prefix)) {
        Some(rest) => rest,
        None => return false,
    };
    match rest.split_once('.') {
        Some((hash, found_ext)) => {
            hash.len() == 32
                && hash.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f'))
                && found_ext == ext
        }
        None => false,
    }
}
