// SPDX-FileCopyrightText: 2026 Vaultplug Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The plugin catalog.
//!
//! Resolves `(name, type)` to a runnable plugin descriptor, stores external
//! plugin registrations, and hands out pooled connections to running plugin
//! processes.
//!
//! A catalog-wide read/write lock orders operations: lookups and listings
//! share it, registrations, deletions, acquisitions and the upgrade sweep
//! take it exclusively. Pool slots are locked only after the catalog lock,
//! and releasing a lease never touches the catalog lock.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use vaultplug_config::model::{CatalogConfig, VaultplugConfig};
use vaultplug_core::{
    BuiltinRegistry, CatalogError, CatalogStore, LaunchOptions, PluginLauncher, PluginRunner,
    PluginType, ProtocolVersion, StorageEntry, collect_keys,
};
use vaultplug_storage::{PrefixedStore, SqliteStore};

use crate::codec;
use crate::detect::TypeDetector;
use crate::pool::{ConnectionPool, MultiplexedClient};
use crate::security;

/// Storage prefix the catalog lives under.
pub const PLUGIN_CATALOG_PATH: &str = "core/plugin-catalog/";

/// The plugin catalog.
pub struct Catalog {
    pub(crate) builtins: Arc<dyn BuiltinRegistry>,
    pub(crate) store: Arc<dyn CatalogStore>,
    pub(crate) launcher: Arc<dyn PluginLauncher>,
    pub(crate) directory: Option<PathBuf>,
    pub(crate) pool: ConnectionPool,
    pub(crate) lock: RwLock<()>,
    pub(crate) cancel: CancellationToken,
}

impl Catalog {
    /// Build a catalog over `store`, which must already be scoped to the
    /// catalog's keys. `directory`, when set, must be canonical.
    pub fn new(
        store: Arc<dyn CatalogStore>,
        builtins: Arc<dyn BuiltinRegistry>,
        launcher: Arc<dyn PluginLauncher>,
        directory: Option<PathBuf>,
    ) -> Self {
        Self {
            builtins,
            store,
            launcher,
            directory,
            pool: ConnectionPool::new(),
            lock: RwLock::new(()),
            cancel: CancellationToken::new(),
        }
    }

    /// Build a catalog from configuration.
    ///
    /// Canonicalizes the plugin directory, scopes `store` under
    /// [`PLUGIN_CATALOG_PATH`] and, when enabled, migrates legacy entries.
    /// A failed migration is logged, not returned.
    pub async fn setup(
        config: &CatalogConfig,
        store: Arc<dyn CatalogStore>,
        builtins: Arc<dyn BuiltinRegistry>,
        launcher: Arc<dyn PluginLauncher>,
    ) -> Result<Self, CatalogError> {
        let directory = match &config.plugin_directory {
            Some(dir) => Some(tokio::fs::canonicalize(dir).await.map_err(|source| {
                CatalogError::Directory {
                    path: dir.clone(),
                    source,
                }
            })?),
            None => None,
        };

        let view: Arc<dyn CatalogStore> = Arc::new(PrefixedStore::new(store, PLUGIN_CATALOG_PATH));
        let catalog = Self::new(view, builtins, launcher, directory);

        if config.upgrade_on_setup {
            match catalog.upgrade_plugins().await {
                Ok(report) if !report.upgraded.is_empty() => {
                    info!(upgraded = report.upgraded.len(), "upgraded legacy plugin entries");
                }
                Ok(_) => {}
                Err(err) => error!(error = %err, "error while upgrading plugin storage"),
            }
        }

        info!(
            plugin_directory = ?catalog.directory,
            "successfully setup plugin catalog"
        );
        Ok(catalog)
    }

    /// Open the SQLite database at `storage.database_path` and set the
    /// catalog up over it with the `[catalog]` settings.
    pub async fn open(
        config: &VaultplugConfig,
        builtins: Arc<dyn BuiltinRegistry>,
        launcher: Arc<dyn PluginLauncher>,
    ) -> Result<Self, CatalogError> {
        let store = SqliteStore::open(&config.storage.database_path).await?;
        debug!(path = %config.storage.database_path, "opened plugin catalog store");
        Self::setup(&config.catalog, Arc::new(store), builtins, launcher).await
    }

    /// Canonical plugin directory, if external plugins are enabled.
    pub fn directory(&self) -> Option<&Path> {
        self.directory.as_deref()
    }

    /// Token cancelling detection started by [`set`](Self::set) and the
    /// upgrade sweep.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Number of open leases on the process for `name`.
    pub async fn pooled_connections(&self, name: &str) -> usize {
        self.pool.connection_count(name).await
    }

    /// Look up `name` of `plugin_type`.
    ///
    /// Stored entries win over builtins. The returned command is absolute.
    /// An entry stored under a different, known type is a miss and does not
    /// fall back to builtins.
    pub async fn get(
        &self,
        name: &str,
        plugin_type: PluginType,
    ) -> Result<Option<PluginRunner>, CatalogError> {
        let _guard = self.lock.read().await;
        self.get_locked(name, plugin_type).await
    }

    /// Like [`get`](Self::get), but a miss is [`CatalogError::PluginNotFound`].
    pub async fn require(
        &self,
        name: &str,
        plugin_type: PluginType,
    ) -> Result<PluginRunner, CatalogError> {
        self.get(name, plugin_type)
            .await?
            .ok_or_else(|| CatalogError::PluginNotFound {
                name: name.to_string(),
                plugin_type,
            })
    }

    pub(crate) async fn get_locked(
        &self,
        name: &str,
        plugin_type: PluginType,
    ) -> Result<Option<PluginRunner>, CatalogError> {
        if let Some(directory) = &self.directory {
            let typed_key = format!("{plugin_type}/{name}");
            let mut stored = self.load(&typed_key).await?;
            if stored.is_none() {
                stored = self.load(name).await?;
            }

            if let Some(stored) = stored {
                let mut entry = codec::decode_entry(&stored.key, &stored.value)?;
                if entry.plugin_type != plugin_type && entry.plugin_type != PluginType::Unknown {
                    return Ok(None);
                }
                entry.command = security::join_command(directory, &entry.command);
                return Ok(Some(entry));
            }
        }

        Ok(self
            .builtins
            .get(name, plugin_type)
            .map(|factory| PluginRunner::builtin(name, plugin_type, factory)))
    }

    async fn load(&self, key: &str) -> Result<Option<StorageEntry>, CatalogError> {
        self.store.get(key).await.map_err(|err| CatalogError::Storage {
            context: format!("failed to retrieve plugin {key:?}"),
            source: Box::new(err),
        })
    }

    /// Register an external plugin.
    ///
    /// `command` is relative to the plugin directory and must resolve to a
    /// file directly inside it. A [`PluginType::Unknown`] type is detected by
    /// starting the binary.
    pub async fn set(
        &self,
        name: &str,
        plugin_type: PluginType,
        command: &str,
        args: Vec<String>,
        env: Vec<String>,
        sha256: Vec<u8>,
    ) -> Result<(), CatalogError> {
        let Some(directory) = self.directory.as_deref() else {
            return Err(CatalogError::DirectoryNotConfigured);
        };
        security::reject_parent_references(name, command)?;

        let _guard = self.lock.write().await;
        let entry = PluginRunner {
            args,
            env,
            sha256,
            ..PluginRunner::external(name, plugin_type, command)
        };
        self.set_locked(directory, entry).await
    }

    /// Validate, type and persist `entry`, whose command is directory-relative.
    pub(crate) async fn set_locked(
        &self,
        directory: &Path,
        mut entry: PluginRunner,
    ) -> Result<(), CatalogError> {
        let command = security::validate_command_path(directory, &entry.command).await?;

        if entry.plugin_type == PluginType::Unknown {
            let candidate = PluginRunner {
                command,
                builtin: false,
                builtin_factory: None,
                ..entry.clone()
            };
            let detected = self.detector().detect(&candidate).await?;
            if detected == PluginType::Unknown {
                return Err(CatalogError::BadPluginType);
            }
            entry.plugin_type = detected;
        }

        let key = format!("{}/{}", entry.plugin_type, entry.name);
        let value = codec::encode_entry(&entry)?;
        self.store
            .put(StorageEntry::new(key.clone(), value))
            .await
            .map_err(|err| CatalogError::Storage {
                context: format!("failed to persist plugin entry {key:?}"),
                source: Box::new(err),
            })?;
        debug!(name = %entry.name, plugin_type = %entry.plugin_type, "stored plugin entry");
        Ok(())
    }

    /// Remove the stored registration of `name`.
    ///
    /// Falls back to the legacy untyped key when no typed entry exists.
    /// Builtins are unaffected.
    pub async fn delete(&self, name: &str, plugin_type: PluginType) -> Result<(), CatalogError> {
        let _guard = self.lock.write().await;

        let typed_key = format!("{plugin_type}/{name}");
        let key = match self.store.get(&typed_key).await {
            Ok(Some(_)) => typed_key,
            _ => name.to_string(),
        };

        self.store
            .delete(&key)
            .await
            .map_err(|err| CatalogError::Storage {
                context: format!("failed to delete plugin {key:?}"),
                source: Box::new(err),
            })
    }

    /// Names of every plugin of `plugin_type`, stored and builtin, sorted and
    /// without duplicates. Any stored entry that fails to load fails the
    /// whole listing.
    pub async fn list(&self, plugin_type: PluginType) -> Result<Vec<String>, CatalogError> {
        let _guard = self.lock.read().await;

        let keys = collect_keys(self.store.as_ref())
            .await
            .map_err(|err| CatalogError::Storage {
                context: "failed to list plugins".to_string(),
                source: Box::new(err),
            })?;

        let prefix = plugin_type.key_prefix();
        let mut names = BTreeSet::new();
        for key in keys {
            if self.get_locked(&key, plugin_type).await?.is_some() {
                let name = key.strip_prefix(&prefix).unwrap_or(&key);
                names.insert(name.to_string());
            }
        }

        names.extend(self.builtins.keys(plugin_type));
        Ok(names.into_iter().collect())
    }

    /// Lease a connection to the process running `runner`.
    ///
    /// Starts the process if none is running for `runner.name`. `log_name`
    /// names the span the plugin's output is logged under. Cancelling
    /// `cancel` aborts a start that is still in progress.
    ///
    /// The lease should be given back with [`MultiplexedClient::close`]. A
    /// dropped lease is released on a spawned task and its close error is
    /// lost.
    pub async fn acquire(
        &self,
        runner: &PluginRunner,
        log_name: &str,
        metadata_mode: bool,
        cancel: &CancellationToken,
    ) -> Result<MultiplexedClient, CatalogError> {
        if runner.builtin {
            return Err(CatalogError::launch(
                &runner.name,
                "builtin plugins run in-process and cannot be pooled",
            ));
        }

        let _guard = self.lock.write().await;
        let options =
            LaunchOptions::new(ProtocolVersion::DatabaseV5, log_name).metadata_mode(metadata_mode);
        self.pool
            .acquire(self.launcher.as_ref(), runner, &options, cancel)
            .await
    }

    pub(crate) fn detector(&self) -> TypeDetector<'_> {
        TypeDetector {
            pool: &self.pool,
            launcher: self.launcher.as_ref(),
            cancel: &self.cancel,
        }
    }
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("directory", &self.directory)
            .finish_non_exhaustive()
    }
}
