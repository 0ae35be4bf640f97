use crate::naming::NamingStrategy;
use crate::traits::{
    normalize_prefix, normalize_uri_prefix, reject_traversal, validate_name, Storage,
    StorageError, StorageResult,
};
use crate::StorageBackend;
use async_trait::async_trait;
use filekeeper_core::PendingFile;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Local filesystem storage implementation
#[derive(Clone, Debug)]
pub struct LocalStorage {
    root: String,
    uri_prefix: Option<String>,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `root` - Root directory for file storage (e.g., "/var/www/public/uploads")
    /// * `uri_prefix` - Public prefix for serving files (e.g., "/uploads" or
    ///   "https://cdn.example.com/uploads"); `None` when files are not web-served
    pub fn new(root: impl Into<String>, uri_prefix: Option<String>) -> Self {
        let root = root.into();
        let root = match root.trim_end_matches('/') {
            "" if root.starts_with('/') => "/".to_string(),
            trimmed => trimmed.to_string(),
        };

        LocalStorage {
            root,
            uri_prefix: uri_prefix.map(|prefix| normalize_uri_prefix(&prefix)),
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    fn join_root(&self, relative_path: &str) -> String {
        if relative_path.is_empty() {
            return self.root.clone();
        }
        if self.root == "/" {
            return relative_path.to_string();
        }
        format!("{}{}", self.root, relative_path)
    }

    /// Move `from` to `to`; falls back to copy + delete across devices.
    async fn move_file(from: &Path, to: &Path) -> StorageResult<()> {
        if fs::rename(from, to).await.is_ok() {
            return Ok(());
        }

        fs::copy(from, to).await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to move file {} to {}: {}",
                from.display(),
                to.display(),
                e
            ))
        })?;

        if let Err(e) = fs::remove_file(from).await {
            tracing::warn!(
                error = %e,
                path = %from.display(),
                "Failed to remove source after copying upload"
            );
        }

        Ok(())
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn upload(
        &self,
        file: &PendingFile,
        naming: &dyn NamingStrategy,
        prefix: &str,
    ) -> StorageResult<String> {
        let prefix = normalize_prefix(prefix);
        let upload_dir = PathBuf::from(self.resolve_path(&prefix)?);
        let start = std::time::Instant::now();

        fs::create_dir_all(&upload_dir).await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to create directory {}: {}",
                upload_dir.display(),
                e
            ))
        })?;

        let name = naming.name(file, Some(&upload_dir)).await;
        validate_name(&name, naming.id())?;

        let target = upload_dir.join(&name);
        Self::move_file(file.path(), &target).await?;

        let relative_path = format!("{}/{}", prefix, name);

        tracing::info!(
            path = %target.display(),
            relative_path = %relative_path,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(relative_path)
    }

    async fn remove(&self, resolved_path: &str) -> StorageResult<bool> {
        let start = std::time::Instant::now();

        let exists = fs::try_exists(resolved_path).await.map_err(|e| {
            StorageError::DeleteFailed(format!("Failed to check file {}: {}", resolved_path, e))
        })?;
        if !exists {
            tracing::debug!(path = %resolved_path, "Local storage remove skipped, file absent");
            return Ok(false);
        }

        fs::remove_file(resolved_path).await.map_err(|e| {
            StorageError::DeleteFailed(format!("Failed to delete file {}: {}", resolved_path, e))
        })?;

        tracing::info!(
            path = %resolved_path,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage delete successful"
        );

        Ok(true)
    }

    fn resolve_path(&self, relative_path: &str) -> StorageResult<String> {
        reject_traversal(relative_path)?;
        Ok(self.join_root(relative_path))
    }

    fn resolve_uri(&self, relative_path: &str) -> Option<String> {
        self.uri_prefix
            .as_ref()
            .map(|prefix| format!("{}{}", prefix, relative_path))
    }

    fn resolve_relative_path(&self, path: &str, _prefix: &str) -> String {
        if self.root == "/" {
            return path.to_string();
        }
        match path.strip_prefix(self.root.as_str()) {
            Some(rest) if rest.is_empty() || rest.starts_with('/') => rest.to_string(),
            _ => path.to_string(),
        }
    }

    async fn download(&self, relative_path: &str, target: &Path) -> StorageResult<()> {
        let source = self.resolve_path(relative_path)?;
        let start = std::time::Instant::now();

        if !fs::metadata(&source).await.map(|m| m.is_file()).unwrap_or(false) {
            return Err(StorageError::NotFound(format!(
                "Cannot download file: \"{}\" does not exist.",
                source
            )));
        }

        let size = fs::copy(&source, target).await.map_err(|e| {
            StorageError::DownloadFailed(format!(
                "Failed to copy file from \"{}\" to \"{}\": {}",
                source,
                target.display(),
                e
            ))
        })?;

        tracing::info!(
            path = %source,
            target = %target.display(),
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage download successful"
        );

        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
