use async_trait::async_trait;
use filekeeper_core::PendingFile;
use md5::{Digest, Md5};
use std::path::Path;
use tokio::io::AsyncReadExt;

use super::{sanitize_file_name, NamingStrategy};

/// Bytes inspected for magic-number detection.
const SNIFF_LEN: usize = 8192;
const FALLBACK_EXTENSION: &str = "bin";

/// Random names: `md5(original name + random salt).ext`.
///
/// Uploading the same bytes twice yields two different names.
#[derive(Debug, Default, Clone, Copy)]
pub struct HashingNamingStrategy;

impl HashingNamingStrategy {
    pub const ID: &'static str = "hashing";

    async fn guess_extension(file: &PendingFile) -> String {
        if let Some(ext) = sniff_extension(file.path()).await {
            return ext.to_string();
        }
        file.original_extension()
            .unwrap_or_else(|| FALLBACK_EXTENSION.to_string())
    }
}

async fn sniff_extension(path: &Path) -> Option<&'static str> {
    let mut handle = tokio::fs::File::open(path).await.ok()?;
    let mut buffer = vec![0u8; SNIFF_LEN];
    let read = handle.read(&mut buffer).await.ok()?;
    infer::get(&buffer[..read]).map(|kind| kind.extension())
}

#[async_trait]
impl NamingStrategy for HashingNamingStrategy {
    fn id(&self) -> &str {
        Self::ID
    }

    async fn name(&self, file: &PendingFile, _target_dir: Option<&Path>) -> String {
        let original_name = sanitize_file_name(&file.original_name());
        let salt = hex::encode(rand::random::<[u8; 8]>());

        let mut hasher = Md5::new();
        hasher.update(original_name.as_bytes());
        hasher.update(salt.as_bytes());
        let digest = format!("{:x}", hasher.finalize());

        format!("{}.{}", digest, Self::guess_extension(file).await)
    }
}
