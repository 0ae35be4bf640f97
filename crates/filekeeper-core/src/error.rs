//! Error types module
//!
//! All failures surfaced by the lifecycle layer are unified under [`FileError`].
//! Configuration, security and operation errors raised while a flush is in progress
//! propagate to the caller and are expected to abort the enclosing transaction.
//! Errors raised while draining post-commit cleanup are logged and swallowed by the
//! orchestrator instead.

use std::io;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like unknown storage names
    Debug,
    /// Warning level - for recoverable issues
    Warn,
    /// Error level - for unexpected failures
    Error,
}

#[derive(Debug, thiserror::Error)]
pub enum FileError {
    /// Missing or invalid per-type metadata, a misbehaving naming strategy or an
    /// empty storage name.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A parent-directory segment was found in a path being resolved or archived.
    #[error("Security error: {0}")]
    Security(String),

    /// Unknown storage name.
    #[error("Not found: {0}")]
    NotFound(String),

    /// An operation was invoked on a record in the wrong state, e.g. upload
    /// without a pending file.
    #[error("Operation error: {0}")]
    Operation(String),

    /// The storage backend failed to perform a physical operation.
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for lifecycle operations
pub type FileResult<T> = Result<T, FileError>;

impl FileError {
    /// Machine-readable error code (e.g., "SECURITY_ERROR")
    pub fn error_code(&self) -> &'static str {
        match self {
            FileError::Configuration(_) => "CONFIGURATION_ERROR",
            FileError::Security(_) => "SECURITY_ERROR",
            FileError::NotFound(_) => "NOT_FOUND",
            FileError::Operation(_) => "OPERATION_ERROR",
            FileError::Storage(_) => "STORAGE_ERROR",
            FileError::Io(_) => "IO_ERROR",
        }
    }

    /// Whether retrying the same call could succeed. Nothing in this crate retries;
    /// callers decide.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, FileError::Storage(_) | FileError::Io(_))
    }

    /// Log level for this error
    pub fn log_level(&self) -> LogLevel {
        match self {
            FileError::NotFound(_) => LogLevel::Debug,
            FileError::Operation(_) | FileError::Configuration(_) => LogLevel::Warn,
            FileError::Security(_) | FileError::Storage(_) | FileError::Io(_) => LogLevel::Error,
        }
    }

    /// Shorthand used by path validation throughout the workspace.
    pub fn path_traversal(path: &str) -> Self {
        FileError::Security(format!(
            "Path traversal detected: \"{}\" contains \"..\".",
            path
        ))
    }
}
