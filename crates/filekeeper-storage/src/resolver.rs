//! Named storage registry

use crate::Storage;
use filekeeper_core::{FileError, FileResult, DEFAULT_STORAGE_NAME};
use std::collections::HashMap;
use std::sync::Arc;

/// Storages by name, in registration order.
///
/// `"default"` always resolves: to a storage explicitly registered under that name,
/// otherwise to the first one registered.
#[derive(Clone, Default)]
pub struct StorageResolver {
    names: Vec<String>,
    storages: HashMap<String, Arc<dyn Storage>>,
}

impl StorageResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `storage` under `name`, replacing any previous registration.
    pub fn add(&mut self, name: &str, storage: Arc<dyn Storage>) -> FileResult<()> {
        if name.is_empty() {
            return Err(FileError::Configuration(
                "Storage name must not be empty.".to_string(),
            ));
        }

        if self.storages.insert(name.to_string(), storage).is_none() {
            self.names.push(name.to_string());
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> FileResult<Arc<dyn Storage>> {
        if let Some(storage) = self.storages.get(name) {
            return Ok(storage.clone());
        }

        if name == DEFAULT_STORAGE_NAME {
            if let Some(storage) = self.names.first().and_then(|n| self.storages.get(n)) {
                return Ok(storage.clone());
            }
        }

        Err(FileError::NotFound(format!(
            "Storage \"{}\" is not registered. Available storages: {}.",
            name,
            self.names.join(", ")
        )))
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
