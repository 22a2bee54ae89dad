// SPDX-FileCopyrightText: 2026 Vaultplug Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the plugin catalog.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VaultplugConfig {
    /// Plugin catalog settings.
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Catalog store settings.
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Plugin catalog configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogConfig {
    /// Directory external plugin binaries must live in.
    /// `None` restricts the catalog to builtin plugins.
    #[serde(default)]
    pub plugin_directory: Option<PathBuf>,

    /// Migrate untyped legacy entries when the catalog is set up.
    #[serde(default = "default_upgrade_on_setup")]
    pub upgrade_on_setup: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            plugin_directory: None,
            upgrade_on_setup: default_upgrade_on_setup(),
        }
    }
}

fn default_upgrade_on_setup() -> bool {
    true
}

/// Catalog store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database holding catalog entries.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_local_dir()
        .map(|d| d.join("vaultplug/catalog.db").display().to_string())
        .unwrap_or_else(|| "vaultplug.db".to_string())
}
