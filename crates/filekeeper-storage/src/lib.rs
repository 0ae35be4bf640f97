//! Filekeeper Storage Library
//!
//! This crate provides the storage abstraction and its implementations for the local
//! filesystem and S3 (through `object_store`), the naming strategies that pick stored
//! file names, and the resolver mapping storage names to backends.
//!
//! # Relative paths
//!
//! Records only ever persist storage-relative paths: `/{prefix}/{name}` with a
//! leading slash, or `/{name}` when the type has no prefix. Paths containing `..`
//! are rejected by every backend.

pub mod factory;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod naming;
pub mod resolver;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::{build_resolver, create_storage};
pub use filekeeper_core::StorageBackend;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use naming::{
    HashingNamingStrategy, NamingStrategy, NamingStrategyFactory, OriginNamingStrategy,
};
pub use resolver::StorageResolver;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
