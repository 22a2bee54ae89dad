// SPDX-FileCopyrightText: 2026 Vaultplug Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Migration of legacy untyped entries.
//!
//! Older catalogs stored entries at the storage root under the bare plugin
//! name. The sweep detects each one's type, rewrites it under its typed key,
//! and removes the legacy key.

use std::path::Path;

use tracing::{error, info};

use vaultplug_core::{CatalogError, MultiError, PluginRunner, PluginType};

use crate::catalog::Catalog;
use crate::{codec, security};

/// Outcome of a successful sweep.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UpgradeReport {
    /// Legacy entries rewritten under a typed key, in sweep order.
    pub upgraded: Vec<(String, PluginType)>,
    /// Entries rewritten whose legacy key could not be removed.
    pub stale_legacy_keys: Vec<String>,
}

impl Catalog {
    /// Migrate every legacy entry at the storage root.
    ///
    /// The sweep keeps going past individual failures and reports them all
    /// together as [`CatalogError::Upgrade`]. A legacy key that cannot be
    /// deleted after its typed copy was written is logged and listed in the
    /// report, not treated as a failure. Without a plugin directory there is
    /// nothing to migrate.
    pub async fn upgrade_plugins(&self) -> Result<UpgradeReport, CatalogError> {
        let _guard = self.lock.write().await;
        let mut report = UpgradeReport::default();

        let Some(directory) = self.directory.as_deref() else {
            return Ok(report);
        };

        let legacy: Vec<String> = self
            .store
            .list("")
            .await
            .map_err(|err| CatalogError::Storage {
                context: "failed to list legacy plugin entries".to_string(),
                source: Box::new(err),
            })?
            .into_iter()
            .filter(|key| !key.ends_with('/'))
            .collect();

        if legacy.is_empty() {
            return Ok(report);
        }
        info!(plugins = ?legacy, "upgrading plugin information");

        let mut failures = MultiError::new();
        for name in legacy {
            let plugin_type = match self.upgrade_entry(directory, &name).await {
                Ok(plugin_type) => plugin_type,
                Err(err) => {
                    failures.push(CatalogError::UpgradeEntry {
                        name,
                        source: Box::new(err),
                    });
                    continue;
                }
            };

            if let Err(err) = self.store.delete(&name).await {
                error!(plugin = %name, error = %err, "could not remove plugin");
                report.stale_legacy_keys.push(name.clone());
            }
            info!(plugin = %name, %plugin_type, "upgraded plugin type");
            report.upgraded.push((name, plugin_type));
        }

        if failures.is_empty() {
            Ok(report)
        } else {
            Err(CatalogError::Upgrade(failures))
        }
    }

    async fn upgrade_entry(&self, directory: &Path, name: &str) -> Result<PluginType, CatalogError> {
        let stored = self
            .store
            .get(name)
            .await
            .map_err(|err| CatalogError::Storage {
                context: format!("failed to load plugin entry {name:?}"),
                source: Box::new(err),
            })?
            .ok_or_else(|| CatalogError::PluginNotFound {
                name: name.to_string(),
                plugin_type: PluginType::Unknown,
            })?;

        let mut entry = codec::decode_entry(name, &stored.value)?;
        entry.name = name.to_string();
        entry.builtin = false;

        let candidate = PluginRunner {
            command: security::validate_command_path(directory, &entry.command).await?,
            ..entry.clone()
        };
        let plugin_type = self.detector().detect(&candidate).await?;
        if plugin_type == PluginType::Unknown {
            return Err(CatalogError::BadPluginType);
        }

        entry.plugin_type = plugin_type;
        self.set_locked(directory, entry).await?;
        Ok(plugin_type)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use vaultplug_core::{BackendType, CatalogStore, StorageEntry};
    use vaultplug_storage::MemoryStore;
    use vaultplug_test_utils::{MockLauncher, MockPluginKind, PluginDir};

    use super::*;
    use crate::builtin::StaticBuiltinRegistry;

    fn legacy_value(name: &str, command: &str) -> Vec<u8> {
        format!(
            r#"{{"name":"{name}","command":"{command}","args":null,"env":null,"sha256":null,"builtin":false}}"#
        )
        .into_bytes()
    }

    fn catalog(dir: &PluginDir, store: Arc<MemoryStore>, launcher: Arc<MockLauncher>) -> Catalog {
        Catalog::new(
            store,
            Arc::new(StaticBuiltinRegistry::new()),
            launcher,
            Some(dir.path().to_path_buf()),
        )
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn legacy_entries_move_to_typed_keys() {
        let dir = PluginDir::new().unwrap();
        dir.add_binary("legacyauth").unwrap();
        dir.add_binary("legacydb").unwrap();
        let launcher = Arc::new(
            MockLauncher::new()
                .with_plugin("legacyauth", MockPluginKind::Backend(BackendType::Credential))
                .with_plugin("legacydb", MockPluginKind::DatabaseV4),
        );
        let store = Arc::new(MemoryStore::new());
        store
            .put(StorageEntry::new("legacyauth", legacy_value("legacyauth", "legacyauth")))
            .await
            .unwrap();
        store
            .put(StorageEntry::new("legacydb", legacy_value("legacydb", "legacydb")))
            .await
            .unwrap();

        let catalog = catalog(&dir, store.clone(), launcher.clone());
        let report = catalog.upgrade_plugins().await.unwrap();

        assert_eq!(
            report.upgraded,
            vec![
                ("legacyauth".to_string(), PluginType::Credential),
                ("legacydb".to_string(), PluginType::Database),
            ]
        );
        assert_eq!(store.keys().await, vec!["auth/legacyauth", "database/legacydb"]);

        let stored = store.get("auth/legacyauth").await.unwrap().unwrap();
        let entry = codec::decode_entry("auth/legacyauth", &stored.value).unwrap();
        assert_eq!(entry.command, Path::new("legacyauth"));
        assert_eq!(launcher.stats().live(), 0);
        assert!(logs_contain("upgraded plugin type"));
    }

    #[tokio::test]
    async fn second_sweep_changes_nothing() {
        let dir = PluginDir::new().unwrap();
        dir.add_binary("legacyauth").unwrap();
        let launcher = Arc::new(
            MockLauncher::new()
                .with_plugin("legacyauth", MockPluginKind::Backend(BackendType::Credential)),
        );
        let store = Arc::new(MemoryStore::new());
        store
            .put(StorageEntry::new("legacyauth", legacy_value("legacyauth", "legacyauth")))
            .await
            .unwrap();

        let catalog = catalog(&dir, store.clone(), launcher.clone());
        catalog.upgrade_plugins().await.unwrap();

        let mutations = store.mutations();
        let launches = launcher.stats().launches();
        let report = catalog.upgrade_plugins().await.unwrap();

        assert!(report.upgraded.is_empty());
        assert_eq!(store.mutations(), mutations);
        assert_eq!(launcher.stats().launches(), launches);
    }

    #[tokio::test]
    async fn failures_are_collected_and_others_proceed() {
        let dir = PluginDir::new().unwrap();
        dir.add_binary("good").unwrap();
        dir.add_binary("mystery").unwrap();
        let launcher = Arc::new(
            MockLauncher::new()
                .with_plugin("good", MockPluginKind::DatabaseV5)
                .with_plugin("mystery", MockPluginKind::Broken),
        );
        let store = Arc::new(MemoryStore::new());
        for (key, value) in [
            ("good", legacy_value("good", "good")),
            ("mystery", legacy_value("mystery", "mystery")),
            ("missing", legacy_value("missing", "not-there")),
            ("garbled", b"{".to_vec()),
        ] {
            store.put(StorageEntry::new(key, value)).await.unwrap();
        }

        let catalog = catalog(&dir, store.clone(), launcher);
        let err = catalog.upgrade_plugins().await.unwrap_err();

        let CatalogError::Upgrade(failures) = err else {
            panic!("expected an upgrade error, got {err}");
        };
        assert_eq!(failures.len(), 3);
        let rendered = failures.to_string();
        assert!(rendered.contains("could not upgrade plugin mystery"));
        assert!(rendered.contains("could not upgrade plugin missing"));
        assert!(rendered.contains("could not upgrade plugin garbled"));

        let keys = store.keys().await;
        assert!(keys.contains(&"database/good".to_string()));
        assert!(!keys.contains(&"good".to_string()));
        assert!(keys.contains(&"mystery".to_string()));
    }

    #[tokio::test]
    async fn without_directory_nothing_happens() {
        let store = Arc::new(MemoryStore::new());
        store
            .put(StorageEntry::new("legacyauth", legacy_value("legacyauth", "legacyauth")))
            .await
            .unwrap();
        let before = store.mutations();

        let catalog = Catalog::new(
            store.clone(),
            Arc::new(StaticBuiltinRegistry::new()),
            Arc::new(MockLauncher::new()),
            None,
        );
        let report = catalog.upgrade_plugins().await.unwrap();
        assert!(report.upgraded.is_empty());
        assert_eq!(store.mutations(), before);
    }
}
