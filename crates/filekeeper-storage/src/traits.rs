//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::naming::NamingStrategy;
use crate::StorageBackend;
use async_trait::async_trait;
use filekeeper_core::{FileError, PendingFile};
use std::path::Path;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Path traversal detected: \"{0}\" contains \"..\".")]
    PathTraversal(String),

    #[error("Invalid filename: {0}")]
    InvalidName(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for FileError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::PathTraversal(path) => FileError::path_traversal(&path),
            StorageError::InvalidName(msg) | StorageError::ConfigError(msg) => {
                FileError::Configuration(msg)
            }
            StorageError::NotFound(what) => FileError::NotFound(what),
            other => FileError::Storage(other.to_string()),
        }
    }
}

/// Storage abstraction trait
///
/// All storage backends (S3, local filesystem) must implement this trait.
///
/// **Path format:** the lifecycle layer only ever persists *relative* paths such as
/// `/docs/3f2a.pdf` (leading slash, rooted at the storage). `resolve_path` turns one
/// into the backend's physical location (an absolute filesystem path or an object
/// key) and `resolve_relative_path` goes back.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Store a pending file under `prefix` and return its relative path
    /// (`/{prefix}/{name}`, or `/{name}` without prefix).
    async fn upload(
        &self,
        file: &PendingFile,
        naming: &dyn NamingStrategy,
        prefix: &str,
    ) -> StorageResult<String>;

    /// Delete by resolved path or key. Returns `false` if nothing was there.
    async fn remove(&self, resolved_path: &str) -> StorageResult<bool>;

    /// Physical location for a relative path. Rejects any path containing `..`.
    fn resolve_path(&self, relative_path: &str) -> StorageResult<String>;

    /// Public URI for a relative path, if the backend has one.
    fn resolve_uri(&self, relative_path: &str) -> Option<String>;

    /// Inverse of [`Storage::resolve_path`].
    fn resolve_relative_path(&self, path: &str, prefix: &str) -> String;

    /// Copy the stored content to a local file.
    async fn download(&self, relative_path: &str, target: &Path) -> StorageResult<()>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}

/// `/{trimmed}` for a non-empty prefix, empty otherwise.
pub(crate) fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}

/// Absolute URLs are kept (minus a trailing slash), anything else becomes `/{trimmed}`.
pub(crate) fn normalize_uri_prefix(prefix: &str) -> String {
    if prefix.contains("://") {
        prefix.trim_end_matches('/').to_string()
    } else {
        format!("/{}", prefix.trim_matches('/'))
    }
}

pub(crate) fn reject_traversal(path: &str) -> StorageResult<()> {
    if path.contains("..") {
        return Err(StorageError::PathTraversal(path.to_string()));
    }
    Ok(())
}

/// Names produced by a naming strategy must be a single path component.
pub(crate) fn validate_name(name: &str, strategy: &str) -> StorageResult<()> {
    if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") {
        return Err(StorageError::InvalidName(format!(
            "Invalid filename \"{}\" returned by naming strategy \"{}\". Filenames must not contain directory separators or \"..\".",
            name, strategy
        )));
    }
    Ok(())
}
