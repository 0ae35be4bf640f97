//! Per-field file operations.
//!
//! The handler moves files in and out of storage and keeps each uploadable field and
//! its mapped-by path field consistent. It never decides *when* to run; that is the
//! orchestrator's job.

use filekeeper_core::{
    EventDispatcher, FieldValue, FileConfig, FileError, FileEvent, FileRef, FileResult,
    NoOpEventDispatcher, Record, RemoveEvent, ResolvedFile, UploadableConfiguration,
};
use filekeeper_storage::{build_resolver, NamingStrategyFactory, Storage, StorageResolver};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct Handler {
    resolver: StorageResolver,
    dispatcher: Arc<dyn EventDispatcher>,
    naming: Arc<NamingStrategyFactory>,
    archive_root: PathBuf,
}

impl Handler {
    pub fn new(
        resolver: StorageResolver,
        dispatcher: Arc<dyn EventDispatcher>,
        naming: Arc<NamingStrategyFactory>,
        archive_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            resolver,
            dispatcher,
            naming,
            archive_root: archive_root.into(),
        }
    }

    /// Handler over every enabled storage in `config`, with the built-in naming
    /// strategies and no event listeners.
    pub fn from_config(config: &FileConfig) -> FileResult<Self> {
        let resolver = build_resolver(config)?;
        Ok(Self::new(
            resolver,
            Arc::new(NoOpEventDispatcher),
            Arc::new(NamingStrategyFactory::new()),
            config.archive_path.clone(),
        ))
    }

    pub fn with_dispatcher(mut self, dispatcher: Arc<dyn EventDispatcher>) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    pub fn resolver(&self) -> &StorageResolver {
        &self.resolver
    }

    pub fn naming_strategies(&self) -> &NamingStrategyFactory {
        &self.naming
    }

    pub fn archive_root(&self) -> &Path {
        &self.archive_root
    }

    fn storage_for(&self, config: &UploadableConfiguration) -> FileResult<Arc<dyn Storage>> {
        self.resolver.get(config.storage())
    }

    /// Mirror a freshly assigned pending file into its path field so the engine
    /// sees the record as changed.
    ///
    /// `field` is the uploadable field. A file this system resolved itself is left
    /// alone: its path field is already correct.
    pub fn notify(
        &self,
        config: &UploadableConfiguration,
        record: &mut dyn Record,
        field: &str,
    ) -> FileResult<()> {
        let path = match record.field_value(field) {
            FieldValue::Null => None,
            FieldValue::File(FileRef::Resolved(_)) => return Ok(()),
            FieldValue::File(FileRef::Pending(file)) => {
                if file.is_file() {
                    let storage = self.storage_for(config)?;
                    Some(storage.resolve_relative_path(
                        &file.path().to_string_lossy(),
                        config.prefix(),
                    ))
                } else {
                    None
                }
            }
            FieldValue::Text(_) => return Ok(()),
        };

        let mapped_by = config.mapped_by(field)?;
        record.set_field_value(mapped_by, FieldValue::from(path));
        Ok(())
    }

    /// Recompute the path field `field` from the file held by its uploadable field.
    pub fn update(
        &self,
        config: &UploadableConfiguration,
        record: &mut dyn Record,
        field: &str,
    ) -> FileResult<()> {
        let storage = self.storage_for(config)?;
        let inversed_by = config.inversed_by(field)?;

        let path = record
            .field_value(inversed_by)
            .as_file()
            .map(|file| storage.resolve_relative_path(&file.path_string(), config.prefix()));

        record.set_field_value(field, FieldValue::from(path));
        Ok(())
    }

    /// Store the pending file behind the path field `field` and replace it with the
    /// resolved file.
    pub async fn upload(
        &self,
        config: &UploadableConfiguration,
        record: &mut dyn Record,
        field: &str,
    ) -> FileResult<()> {
        let storage = self.storage_for(config)?;
        let inversed_by = config.inversed_by(field)?;

        let pending = match record.field_value(inversed_by) {
            FieldValue::File(FileRef::Pending(file)) => file,
            _ => {
                return Err(FileError::Operation(format!(
                    "Field \"{}\" of \"{}\" does not hold a pending upload",
                    inversed_by,
                    record.record_type()
                )))
            }
        };

        self.dispatcher
            .dispatch(FileEvent::PreUpload {
                record: &*record,
                file: &pending,
                field,
            })
            .await;

        let naming = self.naming.create(config.naming_strategy())?;
        let relative_path = storage
            .upload(&pending, naming.as_ref(), config.prefix())
            .await?;

        let resolved = ResolvedFile::new(
            storage.resolve_path(&relative_path)?,
            storage.resolve_uri(&relative_path),
        );
        record.set_field_value(inversed_by, FieldValue::File(resolved.clone().into()));

        tracing::info!(
            record_type = %record.record_type(),
            field = %inversed_by,
            relative_path = %relative_path,
            storage = %config.storage(),
            "File uploaded"
        );

        self.dispatcher
            .dispatch(FileEvent::PostUpload {
                record: &*record,
                file: &resolved,
                field,
            })
            .await;

        Ok(())
    }

    /// Rebuild the uploadable field `field` from its stored path. No I/O.
    pub fn inject(
        &self,
        config: &UploadableConfiguration,
        record: &mut dyn Record,
        field: &str,
    ) -> FileResult<()> {
        let mapped_by = config.mapped_by(field)?;

        let value = match record.field_value(mapped_by).as_text() {
            Some(relative_path) => {
                let storage = self.storage_for(config)?;
                let resolved = ResolvedFile::new(
                    storage.resolve_path(relative_path)?,
                    storage.resolve_uri(relative_path),
                );
                FieldValue::File(resolved.into())
            }
            None => FieldValue::Null,
        };

        record.set_field_value(field, value);
        Ok(())
    }

    /// Delete a stored file. Returns whether anything was deleted.
    pub async fn remove(
        &self,
        record_type: &str,
        storage_name: &str,
        relative_path: Option<&str>,
    ) -> FileResult<bool> {
        let relative_path = match relative_path {
            Some(path) => path,
            None => return Ok(false),
        };

        let storage = self.resolver.get(storage_name)?;
        let event = RemoveEvent {
            record_type: record_type.to_string(),
            relative_path: relative_path.to_string(),
            resolved_path: storage.resolve_path(relative_path)?,
            resolved_uri: storage.resolve_uri(relative_path),
        };

        self.dispatcher.dispatch(FileEvent::PreRemove(&event)).await;
        let removed = storage.remove(&event.resolved_path).await?;
        self.dispatcher.dispatch(FileEvent::PostRemove(&event)).await;

        Ok(removed)
    }

    /// Move a stored file to `{archive_root}/{relative_path}`.
    pub async fn archive(&self, storage_name: &str, relative_path: Option<&str>) -> FileResult<()> {
        let relative_path = match relative_path {
            Some(path) => path,
            None => return Ok(()),
        };

        if relative_path.contains("..") {
            return Err(FileError::path_traversal(relative_path));
        }

        let storage = self.resolver.get(storage_name)?;
        let target = self.archive_root.join(relative_path.trim_start_matches('/'));

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        storage.download(relative_path, &target).await?;
        let resolved_path = storage.resolve_path(relative_path)?;
        storage.remove(&resolved_path).await?;

        tracing::info!(
            storage = %storage_name,
            relative_path = %relative_path,
            target = %target.display(),
            "File archived"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filekeeper_core::{Behaviour, PendingFile};
    use filekeeper_storage::LocalStorage;
    use std::collections::HashMap;
    use tempfile::{tempdir, TempDir};

    struct Doc {
        fields: HashMap<String, FieldValue>,
    }

    impl Doc {
        fn new() -> Self {
            Self {
                fields: HashMap::new(),
            }
        }
    }

    impl Record for Doc {
        fn record_type(&self) -> &str {
            "document"
        }

        fn field_value(&self, field: &str) -> FieldValue {
            self.fields.get(field).cloned().unwrap_or_default()
        }

        fn set_field_value(&mut self, field: &str, value: FieldValue) {
            self.fields.insert(field.to_string(), value);
        }
    }

    struct Fixture {
        root: TempDir,
        incoming: TempDir,
        archive: TempDir,
        handler: Handler,
        config: UploadableConfiguration,
    }

    fn fixture(naming: &str) -> Fixture {
        let root = tempdir().unwrap();
        let incoming = tempdir().unwrap();
        let archive = tempdir().unwrap();

        let mut resolver = StorageResolver::new();
        resolver
            .add(
                "default",
                Arc::new(LocalStorage::new(
                    root.path().to_string_lossy(),
                    Some("/uploads".to_string()),
                )),
            )
            .unwrap();

        let handler = Handler::new(
            resolver,
            Arc::new(NoOpEventDispatcher),
            Arc::new(NamingStrategyFactory::new()),
            archive.path(),
        );
        let config = UploadableConfiguration::builder()
            .prefix("docs")
            .behaviour(Behaviour::Remove)
            .naming_strategy(naming)
            .map_field("file", "file_path")
            .build()
            .unwrap();

        Fixture {
            root,
            incoming,
            archive,
            handler,
            config,
        }
    }

    fn pending(dir: &TempDir, name: &str) -> PendingFile {
        let path = dir.path().join(name);
        std::fs::write(&path, b"content").unwrap();
        PendingFile::new(path)
    }

    #[tokio::test]
    async fn upload_replaces_pending_file_and_update_sets_path() {
        let fx = fixture("origin");
        let mut doc = Doc::new();
        let file = pending(&fx.incoming, "report.pdf");
        doc.set_field_value("file", FieldValue::File(file.into()));

        fx.handler.notify(&fx.config, &mut doc, "file").unwrap();
        assert!(doc.field_value("file_path").as_text().is_some());

        fx.handler.upload(&fx.config, &mut doc, "file_path").await.unwrap();
        fx.handler.update(&fx.config, &mut doc, "file_path").unwrap();

        assert_eq!(doc.field_value("file_path").as_text(), Some("/docs/report.pdf"));
        let resolved = doc.field_value("file");
        let resolved = resolved.as_file().and_then(FileRef::as_resolved).unwrap();
        assert_eq!(resolved.uri(), Some("/uploads/docs/report.pdf"));
        assert!(fx.root.path().join("docs/report.pdf").is_file());
    }

    #[tokio::test]
    async fn upload_without_pending_file_is_an_operation_error() {
        let fx = fixture("hashing");
        let mut doc = Doc::new();
        doc.set_field_value("file_path", FieldValue::Text("/docs/a.txt".into()));

        let err = fx
            .handler
            .upload(&fx.config, &mut doc, "file_path")
            .await
            .unwrap_err();
        assert!(matches!(err, FileError::Operation(_)));
    }

    #[test]
    fn inject_then_update_round_trips_the_path() {
        let fx = fixture("hashing");
        let mut doc = Doc::new();
        doc.set_field_value("file_path", FieldValue::Text("/docs/a1b2.txt".into()));

        fx.handler.inject(&fx.config, &mut doc, "file").unwrap();
        let injected = doc.field_value("file");
        let resolved = injected.as_file().and_then(FileRef::as_resolved).unwrap();
        assert_eq!(
            resolved.path(),
            format!("{}/docs/a1b2.txt", fx.root.path().display())
        );

        fx.handler.update(&fx.config, &mut doc, "file_path").unwrap();
        assert_eq!(doc.field_value("file_path").as_text(), Some("/docs/a1b2.txt"));

        doc.set_field_value("file_path", FieldValue::Null);
        fx.handler.inject(&fx.config, &mut doc, "file").unwrap();
        assert!(doc.field_value("file").is_null());
    }

    #[test]
    fn notify_leaves_resolved_files_alone() {
        let fx = fixture("hashing");
        let mut doc = Doc::new();
        doc.set_field_value("file_path", FieldValue::Text("/docs/a1b2.txt".into()));
        fx.handler.inject(&fx.config, &mut doc, "file").unwrap();

        doc.set_field_value("file_path", FieldValue::Text("/docs/other.txt".into()));
        fx.handler.notify(&fx.config, &mut doc, "file").unwrap();
        assert_eq!(doc.field_value("file_path").as_text(), Some("/docs/other.txt"));
    }

    #[test]
    fn notify_clears_path_for_null_or_vanished_file() {
        let fx = fixture("hashing");
        let mut doc = Doc::new();
        doc.set_field_value("file_path", FieldValue::Text("/docs/a1b2.txt".into()));
        fx.handler.notify(&fx.config, &mut doc, "file").unwrap();
        assert!(doc.field_value("file_path").is_null());

        doc.set_field_value(
            "file",
            FieldValue::File(PendingFile::new("/definitely/not/here.txt").into()),
        );
        doc.set_field_value("file_path", FieldValue::Text("/docs/a1b2.txt".into()));
        fx.handler.notify(&fx.config, &mut doc, "file").unwrap();
        assert!(doc.field_value("file_path").is_null());
    }

    #[tokio::test]
    async fn remove_reports_whether_a_file_existed() {
        let fx = fixture("origin");
        std::fs::create_dir_all(fx.root.path().join("docs")).unwrap();
        std::fs::write(fx.root.path().join("docs/a.txt"), b"x").unwrap();

        let removed = fx
            .handler
            .remove("document", "default", Some("/docs/a.txt"))
            .await
            .unwrap();
        assert!(removed);
        assert!(!fx
            .handler
            .remove("document", "default", Some("/docs/a.txt"))
            .await
            .unwrap());
        assert!(!fx.handler.remove("document", "default", None).await.unwrap());
    }

    #[tokio::test]
    async fn archive_moves_file_under_archive_root() {
        let fx = fixture("origin");
        std::fs::create_dir_all(fx.root.path().join("docs")).unwrap();
        std::fs::write(fx.root.path().join("docs/report.pdf"), b"%PDF").unwrap();

        fx.handler
            .archive("default", Some("/docs/report.pdf"))
            .await
            .unwrap();

        assert_eq!(
            std::fs::read(fx.archive.path().join("docs/report.pdf")).unwrap(),
            b"%PDF"
        );
        assert!(!fx.root.path().join("docs/report.pdf").exists());
    }

    #[tokio::test]
    async fn archive_rejects_traversal() {
        let fx = fixture("origin");
        let err = fx
            .handler
            .archive("default", Some("/docs/../../etc/passwd"))
            .await
            .unwrap_err();
        assert!(matches!(err, FileError::Security(_)));
        fx.handler.archive("default", None).await.unwrap();
    }
}
