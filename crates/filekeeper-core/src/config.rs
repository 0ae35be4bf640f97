//! Configuration module
//!
//! Storage configuration: the named storages, which one answers to `"default"`, and
//! where archived files are moved. Loaded from the environment (a `.env` file is
//! honoured) or from JSON.
//!
//! Environment layout:
//!
//! - `FILEKEEPER_STORAGES`: comma-separated storage names (default `default`)
//! - `FILEKEEPER_DEFAULT_STORAGE`: name of the default storage (default: first enabled)
//! - `FILEKEEPER_ARCHIVE_PATH`: archive root (default `var/archive`)
//! - `FILEKEEPER_STORAGE_<NAME>_DRIVER`: `local` (or `file_system`) / `s3`
//! - `FILEKEEPER_STORAGE_<NAME>_ENABLED`, `_PATH`, `_URI_PREFIX`, `_BUCKET`,
//!   `_REGION`, `_ENDPOINT`

use serde::{Deserialize, Serialize};
use std::env;

use crate::storage_types::StorageBackend;

/// Name every configuration can be resolved under.
pub const DEFAULT_STORAGE_NAME: &str = "default";

const DEFAULT_UPLOAD_PATH: &str = "public/uploads";
const DEFAULT_ARCHIVE_PATH: &str = "var/archive";
const ENV_PREFIX: &str = "FILEKEEPER";

/// One named storage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageSettings {
    #[serde(default)]
    pub driver: StorageBackend,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Root directory for the local driver.
    #[serde(default = "default_upload_path")]
    pub path: String,
    #[serde(default)]
    pub uri_prefix: Option<String>,
    #[serde(default)]
    pub bucket: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    /// Custom endpoint for S3-compatible providers (MinIO, DigitalOcean Spaces, etc.)
    #[serde(default)]
    pub endpoint: Option<String>,
}

fn default_enabled() -> bool {
    true
}

fn default_upload_path() -> String {
    DEFAULT_UPLOAD_PATH.to_string()
}

fn default_archive_path() -> String {
    DEFAULT_ARCHIVE_PATH.to_string()
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            driver: StorageBackend::Local,
            enabled: true,
            path: default_upload_path(),
            uri_prefix: None,
            bucket: None,
            region: None,
            endpoint: None,
        }
    }
}

impl StorageSettings {
    pub fn local(path: impl Into<String>, uri_prefix: Option<String>) -> Self {
        Self {
            path: path.into(),
            uri_prefix,
            ..Self::default()
        }
    }

    pub fn s3(bucket: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            driver: StorageBackend::S3,
            bucket: Some(bucket.into()),
            region: Some(region.into()),
            ..Self::default()
        }
    }

    fn from_env(name: &str) -> Result<Self, anyhow::Error> {
        let var = |suffix: &str| {
            env::var(format!(
                "{}_STORAGE_{}_{}",
                ENV_PREFIX,
                env_key(name),
                suffix
            ))
            .ok()
            .filter(|s| !s.trim().is_empty())
        };

        let driver = match var("DRIVER") {
            Some(driver) => driver.parse()?,
            None => StorageBackend::Local,
        };

        Ok(Self {
            driver,
            enabled: var("ENABLED")
                .map(|s| !matches!(s.to_lowercase().as_str(), "false" | "0" | "no" | "off"))
                .unwrap_or(true),
            path: var("PATH").unwrap_or_else(default_upload_path),
            uri_prefix: var("URI_PREFIX"),
            bucket: var("BUCKET"),
            region: var("REGION"),
            endpoint: var("ENDPOINT"),
        })
    }

    pub fn validate(&self, name: &str) -> Result<(), anyhow::Error> {
        match self.driver {
            StorageBackend::S3 => {
                if self.bucket.as_deref().map_or(true, str::is_empty) {
                    return Err(anyhow::anyhow!(
                        "Storage \"{}\": the \"bucket\" option is required when driver is \"s3\".",
                        name
                    ));
                }
                if self.region.as_deref().map_or(true, str::is_empty) {
                    return Err(anyhow::anyhow!(
                        "Storage \"{}\": the \"region\" option is required when driver is \"s3\".",
                        name
                    ));
                }
            }
            StorageBackend::Local => {
                if self.path.trim().is_empty() {
                    return Err(anyhow::anyhow!(
                        "Storage \"{}\": the \"path\" option must not be empty.",
                        name
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Application file configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileConfig {
    /// If `None`, the first enabled storage is the default.
    #[serde(default)]
    pub default_storage: Option<String>,
    /// Directory files are moved to when a type uses the archive behaviour.
    #[serde(default = "default_archive_path")]
    pub archive_path: String,
    /// Storages in declaration order.
    pub storages: Vec<(String, StorageSettings)>,
}

impl FileConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let names: Vec<String> = env::var(format!("{}_STORAGES", ENV_PREFIX))
            .unwrap_or_else(|_| DEFAULT_STORAGE_NAME.to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let storages = names
            .into_iter()
            .map(|name| StorageSettings::from_env(&name).map(|settings| (name, settings)))
            .collect::<Result<Vec<_>, _>>()?;

        let config = FileConfig {
            default_storage: env::var(format!("{}_DEFAULT_STORAGE", ENV_PREFIX))
                .ok()
                .filter(|s| !s.trim().is_empty()),
            archive_path: env::var(format!("{}_ARCHIVE_PATH", ENV_PREFIX))
                .unwrap_or_else(|_| default_archive_path()),
            storages,
        };

        config.validate()?;
        Ok(config)
    }

    /// Parse from JSON. `storages` is an object; key order is kept.
    pub fn from_json(json: &str) -> Result<Self, anyhow::Error> {
        #[derive(Deserialize)]
        struct Raw {
            #[serde(default)]
            default_storage: Option<String>,
            #[serde(default = "default_archive_path")]
            archive_path: String,
            storages: serde_json::Map<String, serde_json::Value>,
        }

        let raw: Raw = serde_json::from_str(json)?;
        let storages = raw
            .storages
            .into_iter()
            .map(|(name, value)| {
                serde_json::from_value::<StorageSettings>(value)
                    .map(|settings| (name, settings))
                    .map_err(anyhow::Error::from)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let config = FileConfig {
            default_storage: raw.default_storage,
            archive_path: raw.archive_path,
            storages,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn enabled_storages(&self) -> impl Iterator<Item = (&str, &StorageSettings)> {
        self.storages
            .iter()
            .filter(|(_, settings)| settings.enabled)
            .map(|(name, settings)| (name.as_str(), settings))
    }

    /// Name of the storage `"default"` resolves to.
    pub fn default_storage_name(&self) -> Option<&str> {
        match self.default_storage.as_deref() {
            Some(name) => Some(name),
            None => self.enabled_storages().next().map(|(name, _)| name),
        }
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        let enabled: Vec<&str> = self.enabled_storages().map(|(name, _)| name).collect();
        if enabled.is_empty() {
            return Err(anyhow::anyhow!(
                "At least one storage must be defined and enabled."
            ));
        }

        for (name, settings) in &self.storages {
            if name.trim().is_empty() {
                return Err(anyhow::anyhow!("Storage name must not be empty."));
            }
            if settings.enabled {
                settings.validate(name)?;
            }
        }

        if let Some(default) = self.default_storage_name() {
            if !enabled.contains(&default) {
                return Err(anyhow::anyhow!(
                    "Default storage \"{}\" is not defined or not enabled. Available storages: {}.",
                    default,
                    enabled.join(", ")
                ));
            }
        }

        if self.archive_path.trim().is_empty() {
            return Err(anyhow::anyhow!("FILEKEEPER_ARCHIVE_PATH must not be empty"));
        }

        Ok(())
    }
}

fn env_key(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}
