use async_trait::async_trait;
use filekeeper_core::PendingFile;
use std::path::Path;

use super::{sanitize_file_name, NamingStrategy};

/// Keeps the original file name, adding `_1`, `_2`, … before the extension when the
/// name is already taken in the target directory.
///
/// The existence check and the later move are not atomic; concurrent uploads of the
/// same name into one directory can still collide.
#[derive(Debug, Default, Clone, Copy)]
pub struct OriginNamingStrategy;

impl OriginNamingStrategy {
    pub const ID: &'static str = "origin";
}

async fn exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

#[async_trait]
impl NamingStrategy for OriginNamingStrategy {
    fn id(&self) -> &str {
        Self::ID
    }

    async fn name(&self, file: &PendingFile, target_dir: Option<&Path>) -> String {
        let name = sanitize_file_name(&file.original_name());

        let dir = match target_dir {
            Some(dir) if dir.is_dir() => dir,
            _ => return name,
        };

        if !exists(&dir.join(&name)).await {
            return name;
        }

        let (base, extension) = match name.rsplit_once('.') {
            Some((base, ext)) if !base.is_empty() && !ext.is_empty() => (base, Some(ext)),
            _ => (name.as_str(), None),
        };

        let mut version = 1u32;
        loop {
            let candidate = match extension {
                Some(ext) => format!("{}_{}.{}", base, version, ext),
                None => format!("{}_{}", base, version),
            };
            if !exists(&dir.join(&candidate)).await {
                return candidate;
            }
            version += 1;
        }
    }
}
