// SPDX-FileCopyrightText: 2026 Vaultplug Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite catalog store.
//!
//! All statements are serialized through tokio-rusqlite's single background
//! thread. Do NOT open a second connection for writes.

use async_trait::async_trait;
use rusqlite::{OptionalExtension, params};
use tokio_rusqlite::Connection;
use tracing::debug;
use vaultplug_core::{CatalogError, CatalogStore, StorageEntry};

use crate::keys::list_children;
use crate::migrations;

/// Catalog store persisted in the `catalog_entries` table.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Connection,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore").finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Open (or create) the database at `path` and apply pending migrations.
    pub async fn open(path: &str) -> Result<Self, CatalogError> {
        if let Some(parent) = std::path::Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                CatalogError::storage(format!("failed to create directory for {path}"), e)
            })?;
        }

        let conn = Connection::open(path)
            .await
            .map_err(|e| CatalogError::storage(format!("failed to open {path}"), e))?;
        let store = Self { conn };
        store.migrate().await?;
        debug!(path = %path, "opened catalog database");
        Ok(store)
    }

    /// Open a private in-memory database.
    pub async fn open_in_memory() -> Result<Self, CatalogError> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| CatalogError::storage("failed to open in-memory database", e))?;
        let store = Self { conn };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<(), CatalogError> {
        self.conn
            .call(|conn| -> Result<(), CatalogError> { migrations::run_migrations(conn) })
            .await
            .map_err(|e| CatalogError::storage("failed to migrate catalog database", e))
    }
}

#[async_trait]
impl CatalogStore for SqliteStore {
    async fn list(&self, prefix: &str) -> Result<Vec<String>, CatalogError> {
        let prefix_owned = prefix.to_string();
        let keys = self
            .conn
            .call(move |conn| -> Result<Vec<String>, rusqlite::Error> {
                let mut stmt = conn.prepare(
                    "SELECT key FROM catalog_entries \
                     WHERE substr(key, 1, length(?1)) = ?1 ORDER BY key",
                )?;
                let rows = stmt.query_map(params![prefix_owned], |row| row.get(0))?;
                rows.collect()
            })
            .await
            .map_err(|e| CatalogError::storage(format!("failed to list {prefix:?}"), e))?;

        Ok(list_children(keys.iter().map(String::as_str), prefix))
    }

    async fn get(&self, key: &str) -> Result<Option<StorageEntry>, CatalogError> {
        let key_owned = key.to_string();
        let value = self
            .conn
            .call(move |conn| -> Result<Option<Vec<u8>>, rusqlite::Error> {
                conn.query_row(
                    "SELECT value FROM catalog_entries WHERE key = ?1",
                    params![key_owned],
                    |row| row.get(0),
                )
                .optional()
            })
            .await
            .map_err(|e| CatalogError::storage(format!("failed to read {key:?}"), e))?;

        Ok(value.map(|value| StorageEntry::new(key, value)))
    }

    async fn put(&self, entry: StorageEntry) -> Result<(), CatalogError> {
        let key = entry.key.clone();
        self.conn
            .call(move |conn| -> Result<(), rusqlite::Error> {
                conn.execute(
                    "INSERT OR REPLACE INTO catalog_entries (key, value) VALUES (?1, ?2)",
                    params![entry.key, entry.value],
                )?;
                Ok(())
            })
            .await
            .map_err(|e| CatalogError::storage(format!("failed to write {key:?}"), e))
    }

    async fn delete(&self, key: &str) -> Result<(), CatalogError> {
        let key_owned = key.to_string();
        self.conn
            .call(move |conn| -> Result<(), rusqlite::Error> {
                conn.execute(
                    "DELETE FROM catalog_entries WHERE key = ?1",
                    params![key_owned],
                )?;
                Ok(())
            })
            .await
            .map_err(|e| CatalogError::storage(format!("failed to delete {key:?}"), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn entries_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("catalog.db");
        let path = path.to_str().unwrap();

        {
            let store = SqliteStore::open(path).await.unwrap();
            store
                .put(StorageEntry::new("database/mysql", b"{\"name\":\"mysql\"}".to_vec()))
                .await
                .unwrap();
        }

        let store = SqliteStore::open(path).await.unwrap();
        let entry = store.get("database/mysql").await.unwrap().unwrap();
        assert_eq!(entry.value, b"{\"name\":\"mysql\"}");
    }

    #[tokio::test]
    async fn list_folds_folders() {
        let store = SqliteStore::open_in_memory().await.unwrap();
        for key in ["database/mysql", "database/pg", "auth/ldap", "legacy"] {
            store.put(StorageEntry::new(key, vec![1])).await.unwrap();
        }

        assert_eq!(
            store.list("").await.unwrap(),
            vec!["auth/", "database/", "legacy"]
        );
        assert_eq!(store.list("database/").await.unwrap(), vec!["mysql", "pg"]);
    }

    #[tokio::test]
    async fn list_prefix_with_like_metacharacters() {
        let store = SqliteStore::open_in_memory().await.unwrap();
        store.put(StorageEntry::new("a_b/x", vec![])).await.unwrap();
        store.put(StorageEntry::new("aXb/y", vec![])).await.unwrap();

        assert_eq!(store.list("a_b/").await.unwrap(), vec!["x"]);
    }

    #[tokio::test]
    async fn delete_missing_key_is_ok() {
        let store = SqliteStore::open_in_memory().await.unwrap();
        store.delete("missing").await.unwrap();
        assert!(store.get("missing").await.unwrap().is_none());
    }
}
