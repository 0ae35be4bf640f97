//! Naming strategy registry
//!
//! Maps strategy ids to constructors and caches one shared instance per id.

use filekeeper_core::{FileError, FileResult};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::{HashingNamingStrategy, NamingStrategy, OriginNamingStrategy};

pub type NamingStrategyConstructor = Arc<dyn Fn() -> Arc<dyn NamingStrategy> + Send + Sync>;

pub struct NamingStrategyFactory {
    constructors: RwLock<HashMap<String, NamingStrategyConstructor>>,
    instances: RwLock<HashMap<String, Arc<dyn NamingStrategy>>>,
}

impl NamingStrategyFactory {
    /// Factory with the built-in `hashing` and `origin` strategies.
    pub fn new() -> Self {
        let factory = Self::empty();
        factory.register(HashingNamingStrategy::ID, || Arc::new(HashingNamingStrategy));
        factory.register(OriginNamingStrategy::ID, || Arc::new(OriginNamingStrategy));
        factory
    }

    pub fn empty() -> Self {
        Self {
            constructors: RwLock::new(HashMap::new()),
            instances: RwLock::new(HashMap::new()),
        }
    }

    /// Register a custom strategy. Replacing an id drops its cached instance.
    pub fn register<F>(&self, id: impl Into<String>, constructor: F)
    where
        F: Fn() -> Arc<dyn NamingStrategy> + Send + Sync + 'static,
    {
        let id = id.into();
        self.instances
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&id);
        self.constructors
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id, Arc::new(constructor));
    }

    /// Shared instance for `id`, built on first use.
    pub fn create(&self, id: &str) -> FileResult<Arc<dyn NamingStrategy>> {
        if let Some(strategy) = self
            .instances
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(id)
        {
            return Ok(strategy.clone());
        }

        let constructor = self
            .constructors
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(id)
            .cloned()
            .ok_or_else(|| {
                FileError::Configuration(format!("Naming strategy \"{}\" does not exist", id))
            })?;

        let mut instances = self.instances.write().unwrap_or_else(|e| e.into_inner());
        let strategy = instances
            .entry(id.to_string())
            .or_insert_with(|| constructor())
            .clone();

        tracing::debug!(strategy = %id, "Naming strategy instantiated");
        Ok(strategy)
    }

    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .constructors
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }

    /// Drop every cached instance. Registrations are kept.
    pub fn reset(&self) {
        self.instances
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}

impl Default for NamingStrategyFactory {
    fn default() -> Self {
        Self::new()
    }
}
