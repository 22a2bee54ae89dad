// SPDX-FileCopyrightText: 2026 Vaultplug Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A store view scoped under a fixed key prefix.

use std::sync::Arc;

use async_trait::async_trait;
use vaultplug_core::{CatalogError, CatalogStore, StorageEntry};

/// Re-roots an underlying store at `prefix`.
///
/// Keys passed in and returned are relative to the prefix, so the catalog
/// never sees where in the shared store its entries live.
pub struct PrefixedStore {
    inner: Arc<dyn CatalogStore>,
    prefix: String,
}

impl PrefixedStore {
    /// Create a view of `inner` rooted at `prefix`. A missing trailing `/` is added.
    pub fn new(inner: Arc<dyn CatalogStore>, prefix: impl Into<String>) -> Self {
        let mut prefix = prefix.into();
        if !prefix.is_empty() && !prefix.ends_with('/') {
            prefix.push('/');
        }
        Self { inner, prefix }
    }

    /// The prefix this view is rooted at.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn expand(&self, key: &str) -> String {
        format!("{}{key}", self.prefix)
    }
}

#[async_trait]
impl CatalogStore for PrefixedStore {
    async fn list(&self, prefix: &str) -> Result<Vec<String>, CatalogError> {
        self.inner.list(&self.expand(prefix)).await
    }

    async fn get(&self, key: &str) -> Result<Option<StorageEntry>, CatalogError> {
        Ok(self.inner.get(&self.expand(key)).await?.map(|mut entry| {
            entry.key = key.to_string();
            entry
        }))
    }

    async fn put(&self, entry: StorageEntry) -> Result<(), CatalogError> {
        let key = self.expand(&entry.key);
        self.inner.put(StorageEntry::new(key, entry.value)).await
    }

    async fn delete(&self, key: &str) -> Result<(), CatalogError> {
        self.inner.delete(&self.expand(key)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;

    #[tokio::test]
    async fn view_isolates_prefix() {
        let backing = Arc::new(MemoryStore::new());
        let view = PrefixedStore::new(backing.clone(), "core/plugin-catalog");
        assert_eq!(view.prefix(), "core/plugin-catalog/");

        view.put(StorageEntry::new("database/mysql", b"x".to_vec()))
            .await
            .unwrap();
        backing
            .put(StorageEntry::new("core/other", b"y".to_vec()))
            .await
            .unwrap();

        assert_eq!(
            backing.keys().await,
            vec!["core/other", "core/plugin-catalog/database/mysql"]
        );
        assert_eq!(view.list("").await.unwrap(), vec!["database/"]);

        let entry = view.get("database/mysql").await.unwrap().unwrap();
        assert_eq!(entry.key, "database/mysql");

        view.delete("database/mysql").await.unwrap();
        assert_eq!(backing.keys().await, vec!["core/other"]);
    }
}
