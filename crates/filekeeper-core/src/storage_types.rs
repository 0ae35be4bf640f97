use std::fmt;
use std::str::FromStr;

/// Driver of a named storage, as written in configuration (`driver = "s3"`).
///
/// `file_system` is accepted as an alias of `local`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    #[serde(alias = "file_system", alias = "filesystem")]
    Local,
    S3,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" | "file_system" | "filesystem" => Ok(StorageBackend::Local),
            "s3" => Ok(StorageBackend::S3),
            _ => Err(anyhow::anyhow!(
                "Unknown storage driver \"{}\", expected one of: local, s3",
                s
            )),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::Local => f.write_str("local"),
            StorageBackend::S3 => f.write_str("s3"),
        }
    }
}
