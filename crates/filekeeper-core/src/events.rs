//! Lifecycle events
//!
//! The handler announces every physical upload and removal through an
//! [`EventDispatcher`]. Listeners run inline with the operation, so a slow listener
//! slows the flush (for uploads) or the post-commit cleanup (for removals).

use async_trait::async_trait;

use crate::models::{PendingFile, Record, ResolvedFile};

/// Payload shared by the pre/post remove events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveEvent {
    pub record_type: String,
    pub relative_path: String,
    pub resolved_path: String,
    pub resolved_uri: Option<String>,
}

pub enum FileEvent<'a> {
    /// Before a pending file is moved into storage.
    PreUpload {
        record: &'a dyn Record,
        file: &'a PendingFile,
        /// Path (mapped-by) field the upload is for.
        field: &'a str,
    },
    /// After the upload, with the stored file already resolved. Use it for
    /// post-processing such as thumbnails or metadata extraction.
    PostUpload {
        record: &'a dyn Record,
        file: &'a ResolvedFile,
        field: &'a str,
    },
    PreRemove(&'a RemoveEvent),
    PostRemove(&'a RemoveEvent),
}

impl FileEvent<'_> {
    /// Event name, e.g. for logging.
    pub fn name(&self) -> &'static str {
        match self {
            FileEvent::PreUpload { .. } => "pre_upload",
            FileEvent::PostUpload { .. } => "post_upload",
            FileEvent::PreRemove(_) => "pre_remove",
            FileEvent::PostRemove(_) => "post_remove",
        }
    }
}

/// Receives lifecycle events.
#[async_trait]
pub trait EventDispatcher: Send + Sync {
    async fn dispatch(&self, event: FileEvent<'_>);
}

/// No-op implementation for when nobody listens
pub struct NoOpEventDispatcher;

#[async_trait]
impl EventDispatcher for NoOpEventDispatcher {
    async fn dispatch(&self, _event: FileEvent<'_>) {}
}
