//! File references held by uploadable fields.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A raw upload that has not been moved into storage yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingFile {
    path: PathBuf,
    original_name: Option<String>,
    content_type: Option<String>,
}

impl PendingFile {
    /// A local file to be stored, e.g. a temporary file written by a form handler.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            original_name: None,
            content_type: None,
        }
    }

    /// A client upload: `path` is where the bytes live now, `original_name` is the
    /// name the client sent.
    pub fn uploaded(path: impl Into<PathBuf>, original_name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            original_name: Some(original_name.into()),
            content_type: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Client-supplied name when present, otherwise the base name of the local path.
    pub fn original_name(&self) -> String {
        match &self.original_name {
            Some(name) => name.clone(),
            None => self
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        }
    }

    /// Lowercased extension of [`Self::original_name`], if any.
    pub fn original_extension(&self) -> Option<String> {
        let name = self.original_name();
        Path::new(&name)
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .filter(|ext| !ext.is_empty())
    }

    /// Whether the upload is still a regular file on local disk.
    pub fn is_file(&self) -> bool {
        self.path.is_file()
    }
}

/// A stored file rebuilt from its relative path: absolute path (or object key) plus
/// the public URI when the storage has one. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedFile {
    path: String,
    uri: Option<String>,
}

impl ResolvedFile {
    pub fn new(path: impl Into<String>, uri: Option<String>) -> Self {
        Self {
            path: path.into(),
            uri,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }

    pub fn file_name(&self) -> Option<&str> {
        self.path.rsplit('/').next().filter(|name| !name.is_empty())
    }

    pub fn extension(&self) -> Option<&str> {
        self.file_name()
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty())
    }
}

/// Value of an uploadable field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileRef {
    Pending(PendingFile),
    Resolved(ResolvedFile),
}

impl FileRef {
    /// Path the file currently lives at, used to derive a relative path.
    pub fn path_string(&self) -> String {
        match self {
            FileRef::Pending(file) => file.path().to_string_lossy().into_owned(),
            FileRef::Resolved(file) => file.path().to_string(),
        }
    }

    pub fn as_pending(&self) -> Option<&PendingFile> {
        match self {
            FileRef::Pending(file) => Some(file),
            FileRef::Resolved(_) => None,
        }
    }

    pub fn as_resolved(&self) -> Option<&ResolvedFile> {
        match self {
            FileRef::Pending(_) => None,
            FileRef::Resolved(file) => Some(file),
        }
    }
}

impl From<PendingFile> for FileRef {
    fn from(file: PendingFile) -> Self {
        FileRef::Pending(file)
    }
}

impl From<ResolvedFile> for FileRef {
    fn from(file: ResolvedFile) -> Self {
        FileRef::Resolved(file)
    }
}
