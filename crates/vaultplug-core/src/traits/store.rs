// SPDX-FileCopyrightText: 2026 Vaultplug Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Catalog store contract: a flat key-value store with `/`-separated folders.

use async_trait::async_trait;

use crate::error::CatalogError;

/// A single stored value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEntry {
    pub key: String,
    pub value: Vec<u8>,
}

impl StorageEntry {
    pub fn new(key: impl Into<String>, value: Vec<u8>) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Durable storage for catalog entries.
///
/// Keys are flat strings. `list` returns the immediate children of a prefix:
/// leaf keys as their suffix, sub-folders as their first segment followed by
/// `/`. Deleting a missing key is not an error.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list(&self, prefix: &str) -> Result<Vec<String>, CatalogError>;

    async fn get(&self, key: &str) -> Result<Option<StorageEntry>, CatalogError>;

    async fn put(&self, entry: StorageEntry) -> Result<(), CatalogError>;

    async fn delete(&self, key: &str) -> Result<(), CatalogError>;
}

/// Recursively collect every leaf key in the store, sorted.
pub async fn collect_keys(store: &dyn CatalogStore) -> Result<Vec<String>, CatalogError> {
    let mut keys = Vec::new();
    let mut pending = vec![String::new()];

    while let Some(prefix) = pending.pop() {
        for child in store.list(&prefix).await? {
            let full = format!("{prefix}{child}");
            if full.ends_with('/') {
                pending.push(full);
            } else {
                keys.push(full);
            }
        }
    }

    keys.sort();
    Ok(keys)
}
