//! Per-record-type upload metadata.
//!
//! An [`UploadableConfiguration`] is built once per record type (usually when the
//! metadata provider first sees the type) and never mutated afterwards. The field
//! table is bidirectional: every uploadable field names the path field it is
//! persisted through (`mapped_by`), and that path field names it back
//! (`inversed_by`).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::DEFAULT_STORAGE_NAME;
use crate::error::{FileError, FileResult};
use crate::models::behaviour::Behaviour;

/// Naming strategy used when a record type does not pick one.
pub const DEFAULT_NAMING_STRATEGY: &str = "hashing";

/// One side of an uploadable-field/path-field pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldMapping {
    /// In-memory file field, persisted through `mapped_by`.
    Upload { mapped_by: String },
    /// Persisted relative path field, holding the path for `inversed_by`.
    Path { inversed_by: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadableConfiguration {
    prefix: String,
    behaviour: Behaviour,
    naming_strategy: String,
    storage: String,
    mappings: BTreeMap<String, FieldMapping>,
}

impl UploadableConfiguration {
    pub fn builder() -> UploadableConfigurationBuilder {
        UploadableConfigurationBuilder::default()
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn behaviour(&self) -> Behaviour {
        self.behaviour
    }

    pub fn naming_strategy(&self) -> &str {
        &self.naming_strategy
    }

    pub fn storage(&self) -> &str {
        &self.storage
    }

    pub fn mappings(&self) -> &BTreeMap<String, FieldMapping> {
        &self.mappings
    }

    pub fn mapping(&self, field: &str) -> Option<&FieldMapping> {
        self.mappings.get(field)
    }

    /// Fields holding a [`crate::FileRef`].
    pub fn uploadable_field_names(&self) -> impl Iterator<Item = &str> {
        self.mappings.iter().filter_map(|(name, mapping)| match mapping {
            FieldMapping::Upload { .. } => Some(name.as_str()),
            FieldMapping::Path { .. } => None,
        })
    }

    /// Fields holding a persisted relative path.
    pub fn mapped_by_field_names(&self) -> impl Iterator<Item = &str> {
        self.mappings.values().filter_map(|mapping| match mapping {
            FieldMapping::Upload { mapped_by } => Some(mapped_by.as_str()),
            FieldMapping::Path { .. } => None,
        })
    }

    pub fn is_mapped_by_field(&self, field: &str) -> bool {
        matches!(self.mappings.get(field), Some(FieldMapping::Path { .. }))
    }

    /// Path field persisting the given uploadable field.
    pub fn mapped_by(&self, uploadable_field: &str) -> FileResult<&str> {
        match self.mappings.get(uploadable_field) {
            Some(FieldMapping::Upload { mapped_by }) => Ok(mapped_by),
            _ => Err(FileError::Configuration(format!(
                "Field \"{}\" is not an uploadable field",
                uploadable_field
            ))),
        }
    }

    /// Uploadable field whose path the given path field stores.
    pub fn inversed_by(&self, mapped_by_field: &str) -> FileResult<&str> {
        match self.mappings.get(mapped_by_field) {
            Some(FieldMapping::Path { inversed_by }) => Ok(inversed_by),
            _ => Err(FileError::Configuration(format!(
                "Field \"{}\" is not a mapped-by path field",
                mapped_by_field
            ))),
        }
    }
}

/// Validating builder for [`UploadableConfiguration`].
#[derive(Debug, Clone)]
pub struct UploadableConfigurationBuilder {
    prefix: String,
    behaviour: Behaviour,
    naming_strategy: String,
    storage: String,
    fields: Vec<(String, String)>,
}

impl Default for UploadableConfigurationBuilder {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            behaviour: Behaviour::default(),
            naming_strategy: DEFAULT_NAMING_STRATEGY.to_string(),
            storage: DEFAULT_STORAGE_NAME.to_string(),
            fields: Vec::new(),
        }
    }
}

impl UploadableConfigurationBuilder {
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn behaviour(mut self, behaviour: Behaviour) -> Self {
        self.behaviour = behaviour;
        self
    }

    pub fn naming_strategy(mut self, id: impl Into<String>) -> Self {
        self.naming_strategy = id.into();
        self
    }

    pub fn storage(mut self, name: impl Into<String>) -> Self {
        self.storage = name.into();
        self
    }

    /// Declare `upload_field` as uploadable, persisted through `mapped_by`.
    pub fn map_field(mut self, upload_field: impl Into<String>, mapped_by: impl Into<String>) -> Self {
        self.fields.push((upload_field.into(), mapped_by.into()));
        self
    }

    pub fn build(self) -> FileResult<UploadableConfiguration> {
        if self.prefix.contains("..") {
            return Err(FileError::Configuration(format!(
                "The prefix \"{}\" must not contain \"..\".",
                self.prefix
            )));
        }
        if self.naming_strategy.trim().is_empty() {
            return Err(FileError::Configuration(
                "The naming strategy must not be empty.".to_string(),
            ));
        }
        if self.storage.trim().is_empty() {
            return Err(FileError::Configuration(
                "Storage name must not be empty.".to_string(),
            ));
        }
        if self.fields.is_empty() {
            return Err(FileError::Configuration(
                "An uploadable type must map at least one file field.".to_string(),
            ));
        }

        let mut mappings = BTreeMap::new();
        for (upload_field, mapped_by) in &self.fields {
            if upload_field.is_empty() || mapped_by.is_empty() {
                return Err(FileError::Configuration(
                    "The mappedBy property name must not be empty.".to_string(),
                ));
            }
            if upload_field == mapped_by {
                return Err(FileError::Configuration(format!(
                    "Field \"{}\" cannot be mapped by itself",
                    upload_field
                )));
            }
            if mappings.contains_key(upload_field) {
                return Err(FileError::Configuration(format!(
                    "Field \"{}\" is mapped more than once",
                    upload_field
                )));
            }
            mappings.insert(
                upload_field.clone(),
                FieldMapping::Upload {
                    mapped_by: mapped_by.clone(),
                },
            );
        }

        for (upload_field, mapped_by) in self.fields {
            if mappings.contains_key(&mapped_by) {
                return Err(FileError::Configuration(format!(
                    "Field \"{}\" is used both as an uploadable field and as a mapped-by field, or is shared by several uploadable fields",
                    mapped_by
                )));
            }
            mappings.insert(
                mapped_by,
                FieldMapping::Path {
                    inversed_by: upload_field,
                },
            );
        }

        Ok(UploadableConfiguration {
            prefix: self.prefix,
            behaviour: self.behaviour,
            naming_strategy: self.naming_strategy,
            storage: self.storage,
            mappings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document_config() -> UploadableConfiguration {
        UploadableConfiguration::builder()
            .prefix("docs")
            .behaviour(Behaviour::Archive)
            .map_field("file", "file_path")
            .map_field("preview", "preview_path")
            .build()
            .unwrap()
    }

    #[test]
    fn builds_bidirectional_mapping() {
        let config = document_config();

        assert_eq!(config.prefix(), "docs");
        assert_eq!(config.behaviour(), Behaviour::Archive);
        assert_eq!(config.naming_strategy(), DEFAULT_NAMING_STRATEGY);
        assert_eq!(config.storage(), "default");

        let uploadable: Vec<_> = config.uploadable_field_names().collect();
        assert_eq!(uploadable, vec!["file", "preview"]);
        let mapped_by: Vec<_> = config.mapped_by_field_names().collect();
        assert_eq!(mapped_by, vec!["file_path", "preview_path"]);

        assert_eq!(config.mapped_by("file").unwrap(), "file_path");
        assert_eq!(config.inversed_by("file_path").unwrap(), "file");
        assert!(config.is_mapped_by_field("preview_path"));
        assert!(!config.is_mapped_by_field("preview"));
    }

    #[test]
    fn wrong_side_lookups_are_configuration_errors() {
        let config = document_config();
        assert!(matches!(
            config.mapped_by("file_path"),
            Err(FileError::Configuration(_))
        ));
        assert!(matches!(
            config.inversed_by("file"),
            Err(FileError::Configuration(_))
        ));
        assert!(matches!(
            config.mapped_by("missing"),
            Err(FileError::Configuration(_))
        ));
    }

    #[test]
    fn rejects_invalid_definitions() {
        let traversal = UploadableConfiguration::builder()
            .prefix("../etc")
            .map_field("file", "file_path")
            .build();
        assert!(matches!(traversal, Err(FileError::Configuration(_))));

        let no_fields = UploadableConfiguration::builder().build();
        assert!(matches!(no_fields, Err(FileError::Configuration(_))));

        let empty_strategy = UploadableConfiguration::builder()
            .naming_strategy(" ")
            .map_field("file", "file_path")
            .build();
        assert!(matches!(empty_strategy, Err(FileError::Configuration(_))));

        let empty_storage = UploadableConfiguration::builder()
            .storage("")
            .map_field("file", "file_path")
            .build();
        assert!(matches!(empty_storage, Err(FileError::Configuration(_))));

        let shared_path = UploadableConfiguration::builder()
            .map_field("file", "path")
            .map_field("other", "path")
            .build();
        assert!(matches!(shared_path, Err(FileError::Configuration(_))));

        let crossed = UploadableConfiguration::builder()
            .map_field("file", "preview")
            .map_field("preview", "preview_path")
            .build();
        assert!(matches!(crossed, Err(FileError::Configuration(_))));
    }

    #[test]
    fn survives_serialization() {
        let config = document_config();
        let json = serde_json::to_string(&config).unwrap();
        let restored: UploadableConfiguration = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, config);
    }
}
