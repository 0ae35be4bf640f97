#[cfg(feature = "storage-local")]
use crate::LocalStorage;
#[cfg(feature = "storage-s3")]
use crate::S3Storage;
use crate::{Storage, StorageBackend, StorageError, StorageResolver, StorageResult};
use filekeeper_core::{FileConfig, StorageSettings, DEFAULT_STORAGE_NAME};
use std::sync::Arc;

/// Create a storage backend from one storage entry
pub fn create_storage(settings: &StorageSettings) -> StorageResult<Arc<dyn Storage>> {
    match settings.driver {
        #[cfg(feature = "storage-s3")]
        StorageBackend::S3 => {
            let bucket = settings
                .bucket
                .clone()
                .ok_or_else(|| StorageError::ConfigError("S3 bucket not configured".to_string()))?;
            let region = settings
                .region
                .clone()
                .ok_or_else(|| StorageError::ConfigError("S3 region not configured".to_string()))?;

            let storage = S3Storage::new(
                bucket,
                region,
                settings.endpoint.clone(),
                settings.uri_prefix.clone(),
            )?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-s3"))]
        StorageBackend::S3 => Err(StorageError::ConfigError(
            "S3 storage backend not available (storage-s3 feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let storage = LocalStorage::new(settings.path.clone(), settings.uri_prefix.clone());
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => Err(StorageError::ConfigError(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        )),
    }
}

/// Build a resolver holding every enabled storage.
///
/// The configured default storage is also registered as `"default"`.
pub fn build_resolver(config: &FileConfig) -> StorageResult<StorageResolver> {
    let mut resolver = StorageResolver::new();

    for (name, settings) in config.enabled_storages() {
        let storage = create_storage(settings)?;
        resolver
            .add(name, storage)
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        tracing::debug!(
            storage = %name,
            driver = %settings.driver,
            "Storage registered"
        );
    }

    if let Some(default) = config.default_storage_name() {
        if default != DEFAULT_STORAGE_NAME {
            let storage = resolver
                .get(default)
                .map_err(|e| StorageError::ConfigError(e.to_string()))?;
            resolver
                .add(DEFAULT_STORAGE_NAME, storage)
                .map_err(|e| StorageError::ConfigError(e.to_string()))?;
        }
    }

    Ok(resolver)
}
