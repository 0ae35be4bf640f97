//! Domain models: per-type upload configuration, file references and the record
//! boundary the lifecycle layer reads and writes through.

pub mod behaviour;
pub mod configuration;
pub mod file;
pub mod record;

pub use behaviour::{Behaviour, CleanupAction};
pub use configuration::{FieldMapping, UploadableConfiguration, UploadableConfigurationBuilder};
pub use file::{FileRef, PendingFile, ResolvedFile};
pub use record::{FieldValue, MetadataProvider, Record};
