//! Memo of which record types are uploadable.

use std::collections::HashMap;
use tokio::sync::RwLock;

/// Per-type "is uploadable" answers, kept for the owner's lifetime.
///
/// Every load and flush asks about every record it sees, while only a few types
/// ever carry files; a negative answer short-circuits the metadata lookup.
#[derive(Debug, Default)]
pub struct EligibilityCache {
    entries: RwLock<HashMap<String, bool>>,
}

impl EligibilityCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, record_type: &str) -> Option<bool> {
        self.entries.read().await.get(record_type).copied()
    }

    pub async fn set(&self, record_type: &str, uploadable: bool) {
        self.entries
            .write()
            .await
            .insert(record_type.to_string(), uploadable);
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn remembers_answers_until_cleared() {
        let cache = EligibilityCache::new();
        assert_eq!(cache.get("document").await, None);

        cache.set("document", true).await;
        cache.set("audit_log", false).await;
        assert_eq!(cache.get("document").await, Some(true));
        assert_eq!(cache.get("audit_log").await, Some(false));
        assert_eq!(cache.len().await, 2);

        cache.clear().await;
        assert_eq!(cache.get("document").await, None);
    }
}
