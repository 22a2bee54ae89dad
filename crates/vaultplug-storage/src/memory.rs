// SPDX-FileCopyrightText: 2026 Vaultplug Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory catalog store.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use vaultplug_core::{CatalogError, CatalogStore, StorageEntry};

use crate::keys::list_children;

/// Catalog store backed by an ordered in-memory map.
///
/// Counts every `put` and `delete` so callers can assert that an operation
/// left storage untouched.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, Vec<u8>>>,
    mutations: AtomicUsize,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `put`/`delete` calls served so far.
    pub fn mutations(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    /// Snapshot of every stored key, sorted.
    pub async fn keys(&self) -> Vec<String> {
        self.entries.read().await.keys().cloned().collect()
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn list(&self, prefix: &str) -> Result<Vec<String>, CatalogError> {
        let entries = self.entries.read().await;
        Ok(list_children(entries.keys().map(String::as_str), prefix))
    }

    async fn get(&self, key: &str) -> Result<Option<StorageEntry>, CatalogError> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .map(|value| StorageEntry::new(key, value.clone())))
    }

    async fn put(&self, entry: StorageEntry) -> Result<(), CatalogError> {
        self.mutations.fetch_add(1, Ordering::SeqCst);
        self.entries.write().await.insert(entry.key, entry.value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CatalogError> {
        self.mutations.fetch_add(1, Ordering::SeqCst);
        self.entries.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_get_delete_roundtrip() {
        let store = MemoryStore::new();
        store
            .put(StorageEntry::new("database/mysql", b"{}".to_vec()))
            .await
            .unwrap();

        let entry = store.get("database/mysql").await.unwrap().unwrap();
        assert_eq!(entry.value, b"{}");

        store.delete("database/mysql").await.unwrap();
        assert!(store.get("database/mysql").await.unwrap().is_none());
        assert_eq!(store.mutations(), 2);
    }

    #[tokio::test]
    async fn delete_missing_key_is_ok() {
        let store = MemoryStore::new();
        store.delete("nope").await.unwrap();
    }

    #[tokio::test]
    async fn collect_keys_walks_folders() {
        let store = MemoryStore::new();
        for key in ["database/mysql", "auth/ldap", "legacy"] {
            store.put(StorageEntry::new(key, vec![])).await.unwrap();
        }

        let keys = vaultplug_core::traits::collect_keys(&store).await.unwrap();
        assert_eq!(keys, vec!["auth/ldap", "database/mysql", "legacy"]);
    }
}
