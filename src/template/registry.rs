/// Template catalog snapshot using ArcSwap
///
/// Searches read a shared, immutable snapshot. Reloading swaps the whole snapshot
/// pointer so readers never block and never see a half-updated catalog.

use crate::template::{
    storage::TemplateStorage,
    types::{Template, TemplateCategory},
};
use anyhow::Result;
use arc_swap::ArcSwap;
use std::sync::Arc;

#[derive(Debug)]
pub struct TemplateRegistry {
    /// Current catalog, ordered as loaded from storage
    templates: ArcSwap<Vec<Template>>,

    /// Reference to persistent storage for reload operations
    storage: TemplateStorage,
}

impl TemplateRegistry {
    pub fn new(storage: TemplateStorage) -> Self {
        Self {
            templates: ArcSwap::new(Arc::new(Vec::new())),
            storage,
        }
    }

    /// Replace the snapshot with the current contents of storage
    pub async fn reload(&self) -> Result<usize> {
        let templates = self.storage.load_all().await?;
        let count = templates.len();
        self.templates.store(Arc::new(templates));
        tracing::debug!("🔄 Template catalog reloaded ({} templates)", count);
        Ok(count)
    }

    /// Templates matching an optional free-text query and optional category
    ///
    /// An empty or whitespace query matches everything.
    pub fn search(&self, query: Option<&str>, category: Option<TemplateCategory>) -> Vec<Template> {
        let needle = query
            .map(|q| q.trim().to_lowercase())
            .filter(|q| !q.is_empty());
        let snapshot = self.templates.load();

        snapshot
            .iter()
            .filter(|t| category.map_or(true, |c| t.category == c))
            .filter(|t| needle.as_deref().map_or(true, |n| t.matches_query(n)))
            .cloned()
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<Template> {
        self.templates.load().iter().find(|t| t.id == id).cloned()
    }

    /// Record one use in storage and refresh the snapshot
    pub async fn record_use(&self, id: &str) -> Result<()> {
        if self.storage.increment_usage(id).await? {
            self.reload().await?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.templates.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::connect_in_memory;

    async fn seeded_registry() -> TemplateRegistry {
        let storage = TemplateStorage::new(connect_in_memory().await.unwrap());
        storage.seed_defaults().await.unwrap();
        let registry = TemplateRegistry::new(storage);
        registry.reload().await.unwrap();
        registry
    }

    #[tokio::test]
    async fn empty_until_reloaded() {
        let storage = TemplateStorage::new(connect_in_memory().await.unwrap());
        storage.seed_defaults().await.unwrap();
        let registry = TemplateRegistry::new(storage);
        assert!(registry.is_empty());
        assert_eq!(registry.reload().await.unwrap(), 6);
        assert_eq!(registry.len(), 6);
    }

    #[tokio::test]
    async fn search_by_text_and_category() {
        let registry = seeded_registry().await;

        assert_eq!(registry.search(None, None).len(), 6);
        assert_eq!(registry.search(Some("   "), None).len(), 6);

        let email: Vec<String> = registry.search(Some("EMAIL"), None).into_iter().map(|t| t.id).collect();
        assert_eq!(email.len(), 2);
        assert!(email.contains(&"2".to_string()) && email.contains(&"6".to_string()));

        let finance = registry.search(Some("email"), Some(TemplateCategory::Finance));
        assert_eq!(finance.len(), 1);
        assert_eq!(finance[0].id, "6");

        assert!(registry.search(None, Some(TemplateCategory::Hr)).is_empty());
    }

    #[tokio::test]
    async fn record_use_refreshes_snapshot() {
        let registry = seeded_registry().await;
        let before = registry.get("1").unwrap().usage_count;
        registry.record_use("1").await.unwrap();
        assert_eq!(registry.get("1").unwrap().usage_count, before + 1);
        registry.record_use("missing").await.unwrap();
    }
}
