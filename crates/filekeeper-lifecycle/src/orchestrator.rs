//! Lifecycle hooks
//!
//! Wires the handler into the persistence engine's load / pre-flush / flush /
//! commit / rollback events. Uploads happen inside the flush so a failure aborts the
//! transaction; removal and archiving of replaced or deleted files are queued and
//! only run after the commit.

use crate::cache::EligibilityCache;
use crate::handler::Handler;
use crate::unit_of_work::{TrackedRecord, UnitOfWork};
use filekeeper_core::{
    CleanupAction, FileResult, MetadataProvider, Record, UploadableConfiguration,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Deferred cleanup for one record, captured during a flush.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingOperation {
    pub record_type: String,
    pub storage_name: String,
    /// Path (mapped-by) field → relative path to clean up.
    pub paths: BTreeMap<String, String>,
    pub action: CleanupAction,
}

/// Outcome of draining the cleanup queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub removed: usize,
    pub archived: usize,
    pub failed: usize,
}

pub struct LifecycleOrchestrator {
    handler: Arc<Handler>,
    metadata: Arc<dyn MetadataProvider>,
    eligibility: Arc<EligibilityCache>,
    pending: Mutex<Vec<PendingOperation>>,
}

impl LifecycleOrchestrator {
    pub fn new(handler: Arc<Handler>, metadata: Arc<dyn MetadataProvider>) -> Self {
        Self::with_cache(handler, metadata, Arc::new(EligibilityCache::new()))
    }

    pub fn with_cache(
        handler: Arc<Handler>,
        metadata: Arc<dyn MetadataProvider>,
        eligibility: Arc<EligibilityCache>,
    ) -> Self {
        Self {
            handler,
            metadata,
            eligibility,
            pending: Mutex::new(Vec::new()),
        }
    }

    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    pub fn eligibility_cache(&self) -> &EligibilityCache {
        &self.eligibility
    }

    /// Upload configuration for `record_type`, or `None` when the type carries no
    /// files.
    async fn configuration(&self, record_type: &str) -> Option<Arc<UploadableConfiguration>> {
        if self.eligibility.get(record_type).await == Some(false) {
            return None;
        }

        let config = self.metadata.configuration(record_type);
        self.eligibility.set(record_type, config.is_some()).await;
        if config.is_none() {
            tracing::debug!(record_type = %record_type, "Record type is not uploadable");
        }
        config
    }

    /// Rebuild resolved files from the stored paths of a freshly loaded record.
    #[tracing::instrument(skip(self, record), fields(record_type = %record.record_type()))]
    pub async fn on_load(&self, record: &mut dyn Record) -> FileResult<()> {
        let config = match self.configuration(record.record_type()).await {
            Some(config) => config,
            None => return Ok(()),
        };

        for field in config.uploadable_field_names() {
            self.handler.inject(&config, record, field)?;
        }
        Ok(())
    }

    /// Reflect newly assigned files in their path fields before the engine diffs.
    #[tracing::instrument(skip(self, uow))]
    pub async fn on_pre_flush(&self, uow: &mut dyn UnitOfWork) -> FileResult<()> {
        for record in uow.tracked_records() {
            let config = match self.configuration(record.record_type()).await {
                Some(config) => config,
                None => continue,
            };

            for field in config.uploadable_field_names() {
                self.handler.notify(&config, record, field)?;
            }
        }
        Ok(())
    }

    /// Store new files and queue the old ones for cleanup. Any error aborts the flush
    /// and nothing from it is queued.
    #[tracing::instrument(skip(self, uow))]
    pub async fn on_flush(&self, uow: &mut dyn UnitOfWork) -> FileResult<()> {
        let mut queued = Vec::new();

        for tracked in uow.scheduled_insertions() {
            let config = match self.configuration(tracked.record().record_type()).await {
                Some(config) => config,
                None => continue,
            };

            self.upload_changed(&config, tracked).await?;
            self.update_changed(&config, tracked)?;
        }

        for tracked in uow.scheduled_updates() {
            let config = match self.configuration(tracked.record().record_type()).await {
                Some(config) => config,
                None => continue,
            };

            queued.extend(Self::replaced(&config, tracked));
            self.upload_changed(&config, tracked).await?;
            self.update_changed(&config, tracked)?;
        }

        for record in uow.scheduled_deletions() {
            let config = match self.configuration(record.record_type()).await {
                Some(config) => config,
                None => continue,
            };

            queued.extend(Self::deleted(&config, record));
        }

        if !queued.is_empty() {
            self.pending.lock().await.extend(queued);
        }
        Ok(())
    }

    /// Run the queued removals and archives. Individual failures are logged and
    /// counted; they never stop the remaining entries.
    #[tracing::instrument(skip(self))]
    pub async fn on_post_commit(&self) -> CleanupReport {
        let operations = std::mem::take(&mut *self.pending.lock().await);
        let mut report = CleanupReport::default();

        for operation in &operations {
            for (field, relative_path) in &operation.paths {
                match operation.action {
                    CleanupAction::Remove => {
                        match self
                            .handler
                            .remove(
                                &operation.record_type,
                                &operation.storage_name,
                                Some(relative_path),
                            )
                            .await
                        {
                            Ok(true) => report.removed += 1,
                            Ok(false) => {
                                tracing::debug!(
                                    relative_path = %relative_path,
                                    "Queued file was already gone"
                                );
                            }
                            Err(e) => {
                                report.failed += 1;
                                tracing::error!(
                                    error = %e,
                                    error_code = e.error_code(),
                                    record_type = %operation.record_type,
                                    storage = %operation.storage_name,
                                    field = %field,
                                    relative_path = %relative_path,
                                    "Failed to remove file after commit"
                                );
                            }
                        }
                    }
                    CleanupAction::Archive => {
                        match self
                            .handler
                            .archive(&operation.storage_name, Some(relative_path))
                            .await
                        {
                            Ok(()) => report.archived += 1,
                            Err(e) => {
                                report.failed += 1;
                                tracing::error!(
                                    error = %e,
                                    error_code = e.error_code(),
                                    record_type = %operation.record_type,
                                    storage = %operation.storage_name,
                                    field = %field,
                                    relative_path = %relative_path,
                                    "Failed to archive file after commit"
                                );
                            }
                        }
                    }
                }
            }
        }

        if !operations.is_empty() {
            tracing::info!(
                removed = report.removed,
                archived = report.archived,
                failed = report.failed,
                "Post-commit file cleanup completed"
            );
        }

        report
    }

    /// Drop the queue; the transaction did not commit, so the old files stay.
    /// Returns the number of discarded operations.
    #[tracing::instrument(skip(self))]
    pub async fn on_rollback(&self) -> usize {
        let discarded = std::mem::take(&mut *self.pending.lock().await).len();
        if discarded > 0 {
            tracing::info!(discarded, "Discarded queued file cleanup after rollback");
        }
        discarded
    }

    /// Snapshot of the cleanup queue.
    pub async fn pending_operations(&self) -> Vec<PendingOperation> {
        self.pending.lock().await.clone()
    }

    /// Path fields of `config` present in the record's change set.
    fn changed_path_fields(
        config: &UploadableConfiguration,
        tracked: &dyn TrackedRecord,
    ) -> Vec<String> {
        let changes = tracked.change_set();
        config
            .mapped_by_field_names()
            .filter(|field| changes.contains(field))
            .map(String::from)
            .collect()
    }

    async fn upload_changed(
        &self,
        config: &UploadableConfiguration,
        tracked: &mut dyn TrackedRecord,
    ) -> FileResult<()> {
        for field in Self::changed_path_fields(config, tracked) {
            if tracked.record().field_value(&field).is_null() {
                continue;
            }
            self.handler
                .upload(config, tracked.record_mut(), &field)
                .await?;
        }
        Ok(())
    }

    fn update_changed(
        &self,
        config: &UploadableConfiguration,
        tracked: &mut dyn TrackedRecord,
    ) -> FileResult<()> {
        for field in Self::changed_path_fields(config, tracked) {
            self.handler.update(config, tracked.record_mut(), &field)?;
        }
        tracked.recompute_change_set();
        Ok(())
    }

    /// Cleanup for the previous paths of changed path fields.
    fn replaced(
        config: &UploadableConfiguration,
        tracked: &dyn TrackedRecord,
    ) -> Option<PendingOperation> {
        let changes = tracked.change_set();
        let paths: BTreeMap<String, String> = Self::changed_path_fields(config, tracked)
            .into_iter()
            .filter_map(|field| {
                let old = changes.old_value(&field)?.as_text()?.to_string();
                Some((field, old))
            })
            .collect();

        Self::cleanup(tracked.record().record_type(), config, paths)
    }

    /// Cleanup for the current paths of a record being deleted.
    fn deleted(config: &UploadableConfiguration, record: &dyn Record) -> Option<PendingOperation> {
        let paths: BTreeMap<String, String> = config
            .mapped_by_field_names()
            .filter_map(|field| {
                let path = record.field_value(field).as_text()?.to_string();
                Some((field.to_string(), path))
            })
            .collect();

        Self::cleanup(record.record_type(), config, paths)
    }

    /// `None` for the keep behaviour or when there is nothing to clean up.
    fn cleanup(
        record_type: &str,
        config: &UploadableConfiguration,
        paths: BTreeMap<String, String>,
    ) -> Option<PendingOperation> {
        let action = config.behaviour().cleanup_action()?;
        if paths.is_empty() {
            return None;
        }

        tracing::debug!(
            record_type = %record_type,
            storage = %config.storage(),
            action = ?action,
            files = paths.len(),
            "File cleanup captured"
        );

        Some(PendingOperation {
            record_type: record_type.to_string(),
            storage_name: config.storage().to_string(),
            paths,
            action,
        })
    }
}
