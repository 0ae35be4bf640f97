//! Naming strategies
//!
//! A naming strategy decides the final file name of an upload. Strategies are
//! looked up by id through [`NamingStrategyFactory`] and shared as
//! `Arc<dyn NamingStrategy>`.

pub mod factory;
pub mod hashing;
pub mod origin;

pub use factory::{NamingStrategyConstructor, NamingStrategyFactory};
pub use hashing::HashingNamingStrategy;
pub use origin::OriginNamingStrategy;

use async_trait::async_trait;
use filekeeper_core::PendingFile;
use std::path::Path;

const FALLBACK_NAME: &str = "file";

#[async_trait]
pub trait NamingStrategy: Send + Sync {
    /// Identifier the strategy is registered under.
    fn id(&self) -> &str;

    /// Name for `file`. `target_dir` is the resolved destination directory, `None`
    /// for remote storages.
    async fn name(&self, file: &PendingFile, target_dir: Option<&Path>) -> String;
}

/// Reduce a client-supplied name to a single safe path component.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .replace("..", "");
    let base = base.trim();

    if base.is_empty() || base == "." {
        FALLBACK_NAME.to_string()
    } else {
        base.to_string()
    }
}
