use crate::naming::NamingStrategy;
use crate::traits::{
    normalize_prefix, normalize_uri_prefix, reject_traversal, validate_name, Storage,
    StorageError, StorageResult,
};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use filekeeper_core::PendingFile;
use object_store::aws::AmazonS3Builder;
use object_store::path::Path as ObjectPath;
use object_store::Error as ObjectStoreError;
use object_store::{
    Attribute, Attributes, ObjectStore, ObjectStoreExt, PutOptions, PutPayload,
    Result as ObjectResult,
};
use std::path::Path;
use std::sync::Arc;

/// S3 storage implementation
#[derive(Clone)]
pub struct S3Storage {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    region: String,
    endpoint_url: Option<String>, // Custom endpoint for S3-compatible providers
    uri_prefix: Option<String>,
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO, "https://nyc3.digitaloceanspaces.com" for DigitalOcean Spaces)
    /// * `uri_prefix` - Optional public prefix (CDN); defaults to the bucket's object URL
    pub fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
        uri_prefix: Option<String>,
    ) -> StorageResult<Self> {
        // Credentials come from the environment (AWS_ACCESS_KEY_ID, ...).
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region.clone())
            .with_bucket_name(bucket.clone());

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(Self::with_store(
            Arc::new(store),
            bucket,
            region,
            endpoint_url,
            uri_prefix,
        ))
    }

    /// Wrap an existing object store, e.g. `object_store::memory::InMemory` in tests.
    pub fn with_store(
        store: Arc<dyn ObjectStore>,
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
        uri_prefix: Option<String>,
    ) -> Self {
        S3Storage {
            store,
            bucket,
            region,
            endpoint_url,
            uri_prefix: uri_prefix.map(|prefix| normalize_uri_prefix(&prefix)),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Generate public URL for S3 object
    ///
    /// For AWS S3, uses the standard format: https://{bucket}.s3.{region}.amazonaws.com/{key}
    /// For S3-compatible providers, uses the endpoint URL if provided
    fn generate_url(&self, key: &str) -> String {
        if let Some(ref endpoint) = self.endpoint_url {
            // Path-style: {endpoint}/{bucket}/{key}
            let base_url = endpoint.trim_end_matches('/');
            format!("{}/{}/{}", base_url, self.bucket, key)
        } else {
            format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.bucket, self.region, key
            )
        }
    }

    fn location(key: &str) -> ObjectPath {
        ObjectPath::from(key.trim_start_matches('/'))
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn upload(
        &self,
        file: &PendingFile,
        naming: &dyn NamingStrategy,
        prefix: &str,
    ) -> StorageResult<String> {
        let prefix = normalize_prefix(prefix);
        let name = naming.name(file, None).await;
        validate_name(&name, naming.id())?;

        let key = format!("{}/{}", prefix, name)
            .trim_start_matches('/')
            .to_string();
        let start = std::time::Instant::now();

        let data = tokio::fs::read(file.path()).await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to read {}: {}",
                file.path().display(),
                e
            ))
        })?;
        let size = data.len() as u64;

        let mut options = PutOptions::default();
        if let Some(content_type) = file.content_type() {
            let mut attributes = Attributes::new();
            attributes.insert(Attribute::ContentType, content_type.to_string().into());
            options.attributes = attributes;
        }

        let result: ObjectResult<_> = self
            .store
            .put_opts(
                &Self::location(&key),
                PutPayload::from(Bytes::from(data)),
                options,
            )
            .await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 upload failed"
            );
            StorageError::UploadFailed(format!(
                "Failed to upload file to S3 bucket \"{}\" with key \"{}\": {}",
                self.bucket, key, e
            ))
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(format!("{}/{}", prefix, name))
    }

    async fn remove(&self, resolved_path: &str) -> StorageResult<bool> {
        let start = std::time::Instant::now();
        let location = Self::location(resolved_path);

        match self.store.head(&location).await {
            Ok(_) => {}
            Err(ObjectStoreError::NotFound { .. }) => {
                tracing::debug!(
                    bucket = %self.bucket,
                    key = %resolved_path,
                    "S3 remove skipped, object absent"
                );
                return Ok(false);
            }
            Err(e) => return Err(StorageError::BackendError(e.to_string())),
        }

        let result: ObjectResult<_> = self.store.delete(&location).await;

        match result {
            Ok(()) => {}
            Err(ObjectStoreError::NotFound { .. }) => return Ok(false),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %resolved_path,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 delete failed"
                );
                return Err(StorageError::DeleteFailed(e.to_string()));
            }
        }

        tracing::info!(
            bucket = %self.bucket,
            key = %resolved_path,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 delete successful"
        );

        Ok(true)
    }

    fn resolve_path(&self, relative_path: &str) -> StorageResult<String> {
        reject_traversal(relative_path)?;
        Ok(relative_path.trim_start_matches('/').to_string())
    }

    fn resolve_uri(&self, relative_path: &str) -> Option<String> {
        match self.uri_prefix {
            Some(ref prefix) => Some(format!("{}{}", prefix, relative_path)),
            None => Some(self.generate_url(relative_path.trim_start_matches('/'))),
        }
    }

    fn resolve_relative_path(&self, path: &str, prefix: &str) -> String {
        let prefix = normalize_prefix(prefix);

        if !prefix.is_empty() && path.starts_with(&prefix) {
            return path.to_string();
        }

        let base_name = path.rsplit('/').next().unwrap_or(path);
        format!("{}/{}", prefix, base_name)
    }

    async fn download(&self, relative_path: &str, target: &Path) -> StorageResult<()> {
        let key = self.resolve_path(relative_path)?;
        let start = std::time::Instant::now();

        let result: ObjectResult<_> = self.store.get(&Self::location(&key)).await;

        let result = result.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(key.clone()),
            other => {
                tracing::error!(
                    error = %other,
                    bucket = %self.bucket,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 download failed"
                );
                StorageError::DownloadFailed(format!(
                    "Failed to download file from S3 bucket \"{}\" with key \"{}\": {}",
                    self.bucket, key, other
                ))
            }
        })?;

        let bytes = result
            .bytes()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))?;
        let size = bytes.len() as u64;

        tokio::fs::write(target, &bytes).await.map_err(|e| {
            StorageError::DownloadFailed(format!(
                "Failed to write {}: {}",
                target.display(),
                e
            ))
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 download successful"
        );

        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}
