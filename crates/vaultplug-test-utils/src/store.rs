// SPDX-FileCopyrightText: 2026 Vaultplug Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Catalog store that fails every operation.

use async_trait::async_trait;

use vaultplug_core::{CatalogError, CatalogStore, StorageEntry};

/// Store standing in for an unreachable backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingStore;

fn unavailable(op: &str, key: &str) -> CatalogError {
    CatalogError::storage(
        format!("{op} {key:?}"),
        std::io::Error::new(std::io::ErrorKind::NotConnected, "store unavailable"),
    )
}

#[async_trait]
impl CatalogStore for FailingStore {
    async fn list(&self, prefix: &str) -> Result<Vec<String>, CatalogError> {
        Err(unavailable("list", prefix))
    }

    async fn get(&self, key: &str) -> Result<Option<StorageEntry>, CatalogError> {
        Err(unavailable("get", key))
    }

    async fn put(&self, entry: StorageEntry) -> Result<(), CatalogError> {
        Err(unavailable("put", &entry.key))
    }

    async fn delete(&self, key: &str) -> Result<(), CatalogError> {
        Err(unavailable("delete", key))
    }
}
