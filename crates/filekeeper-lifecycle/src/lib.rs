//! Filekeeper Lifecycle Library
//!
//! Binds file storage to a persistence engine's record lifecycle:
//!
//! - **load**: stored relative paths become [`filekeeper_core::ResolvedFile`]s
//! - **pre-flush**: newly assigned pending files mark their path fields as changed
//! - **flush**: pending files are stored and their path fields rewritten; files that
//!   are replaced or whose record is deleted are queued
//! - **commit**: the queue is drained (remove or archive, per record type)
//! - **rollback**: the queue is discarded
//!
//! The engine plugs in through [`UnitOfWork`] / [`TrackedRecord`] and the
//! [`filekeeper_core::MetadataProvider`].

pub mod cache;
pub mod handler;
pub mod orchestrator;
pub mod unit_of_work;

// Re-export commonly used types
pub use cache::EligibilityCache;
pub use handler::Handler;
pub use orchestrator::{CleanupReport, LifecycleOrchestrator, PendingOperation};
pub use unit_of_work::{ChangeSet, TrackedRecord, UnitOfWork};
