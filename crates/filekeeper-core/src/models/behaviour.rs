use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// What happens to a file once the record no longer points at it, either because the
/// record was deleted or because its file was replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Behaviour {
    Keep,
    #[default]
    Remove,
    Archive,
}

/// Deferred action queued for after commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CleanupAction {
    Remove,
    Archive,
}

impl Behaviour {
    /// `None` for [`Behaviour::Keep`]: nothing gets queued.
    pub fn cleanup_action(self) -> Option<CleanupAction> {
        match self {
            Behaviour::Keep => None,
            Behaviour::Remove => Some(CleanupAction::Remove),
            Behaviour::Archive => Some(CleanupAction::Archive),
        }
    }
}

impl FromStr for Behaviour {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "keep" => Ok(Behaviour::Keep),
            "remove" => Ok(Behaviour::Remove),
            "archive" => Ok(Behaviour::Archive),
            _ => Err(anyhow::anyhow!("Invalid behaviour: {}", s)),
        }
    }
}

impl Display for Behaviour {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Behaviour::Keep => write!(f, "keep"),
            Behaviour::Remove => write!(f, "remove"),
            Behaviour::Archive => write!(f, "archive"),
        }
    }
}

impl Display for CleanupAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            CleanupAction::Remove => write!(f, "remove"),
            CleanupAction::Archive => write!(f, "archive"),
        }
    }
}
