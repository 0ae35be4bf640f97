//! Filekeeper Core Library
//!
//! This crate provides the domain models, error types, storage configuration and
//! lifecycle events shared by every Filekeeper component.
//!
//! A record type is *uploadable* when its [`UploadableConfiguration`] maps at least
//! one in-memory file field to a persisted path field. The path field only ever holds
//! a storage-relative path such as `/docs/3f2a….pdf`; the file field holds a
//! [`FileRef`] that is either a raw upload waiting to be stored or a
//! [`ResolvedFile`] rebuilt from the stored path.

pub mod config;
pub mod error;
pub mod events;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{FileConfig, StorageSettings, DEFAULT_STORAGE_NAME};
pub use error::{FileError, FileResult, LogLevel};
pub use events::{EventDispatcher, FileEvent, NoOpEventDispatcher, RemoveEvent};
pub use models::{
    Behaviour, CleanupAction, FieldMapping, FieldValue, FileRef, MetadataProvider, PendingFile,
    Record, ResolvedFile, UploadableConfiguration, UploadableConfigurationBuilder,
};
pub use storage_types::StorageBackend;
