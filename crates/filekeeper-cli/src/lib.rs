use filekeeper_core::{FileConfig, FileResult, PendingFile, StorageBackend};
use filekeeper_lifecycle::Handler;
use serde::Serialize;
use std::path::Path;

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

#[derive(Debug, Serialize)]
pub struct StorageSummary {
    pub name: String,
    pub driver: StorageBackend,
    pub enabled: bool,
    /// Root directory, or `s3://bucket`.
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri_prefix: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ConfigSummary {
    pub default_storage: Option<String>,
    pub archive_path: String,
    pub storages: Vec<StorageSummary>,
}

impl ConfigSummary {
    pub fn from_config(config: &FileConfig) -> Self {
        let storages = config
            .storages
            .iter()
            .map(|(name, settings)| StorageSummary {
                name: name.clone(),
                driver: settings.driver,
                enabled: settings.enabled,
                location: match settings.driver {
                    StorageBackend::Local => settings.path.clone(),
                    StorageBackend::S3 => {
                        format!("s3://{}", settings.bucket.as_deref().unwrap_or_default())
                    }
                },
                uri_prefix: settings.uri_prefix.clone(),
            })
            .collect();

        Self {
            default_storage: config.default_storage_name().map(String::from),
            archive_path: config.archive_path.clone(),
            storages,
        }
    }
}

/// Where a relative path lives in a storage.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct Location {
    pub storage: String,
    pub relative_path: String,
    pub path: String,
    pub uri: Option<String>,
}

pub fn resolve(handler: &Handler, storage_name: &str, relative_path: &str) -> FileResult<Location> {
    let storage = handler.resolver().get(storage_name)?;
    Ok(Location {
        storage: storage_name.to_string(),
        relative_path: relative_path.to_string(),
        path: storage.resolve_path(relative_path)?,
        uri: storage.resolve_uri(relative_path),
    })
}

/// Move a local file into a storage under `prefix`, named by `naming_strategy`.
pub async fn upload(
    handler: &Handler,
    storage_name: &str,
    file: &Path,
    prefix: &str,
    naming_strategy: &str,
) -> FileResult<Location> {
    let storage = handler.resolver().get(storage_name)?;
    let naming = handler.naming_strategies().create(naming_strategy)?;

    let relative_path = storage
        .upload(&PendingFile::new(file), naming.as_ref(), prefix)
        .await?;

    resolve(handler, storage_name, &relative_path)
}
