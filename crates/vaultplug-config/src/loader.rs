// SPDX-FileCopyrightText: 2026 Vaultplug Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./vaultplug.toml` > `~/.config/vaultplug/vaultplug.toml`
//! > `/etc/vaultplug/vaultplug.toml`, with environment variable overrides via the
//! `VAULTPLUG_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::VaultplugConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/vaultplug/vaultplug.toml`
/// 3. `~/.config/vaultplug/vaultplug.toml`
/// 4. `./vaultplug.toml`
/// 5. `VAULTPLUG_*` environment variables
pub fn load_config() -> Result<VaultplugConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(VaultplugConfig::default()))
        .merge(Toml::file("/etc/vaultplug/vaultplug.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("vaultplug/vaultplug.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("vaultplug.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<VaultplugConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(VaultplugConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<VaultplugConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(VaultplugConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Map `VAULTPLUG_SECTION_KEY` to `section.key`.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `VAULTPLUG_CATALOG_PLUGIN_DIRECTORY` must map to
/// `catalog.plugin_directory`. The key arrives in its original case.
fn env_provider() -> Env {
    Env::prefixed("VAULTPLUG_").map(|key| {
        key.as_str()
            .to_ascii_lowercase()
            .replacen("catalog_", "catalog.", 1)
            .replacen("storage_", "storage.", 1)
            .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_overrides_plugin_directory() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("vaultplug.toml", "[catalog]\nplugin_directory = \"/from-file\"\n")?;
            jail.set_env("VAULTPLUG_CATALOG_PLUGIN_DIRECTORY", "/from-env");

            let config = load_config_from_path(Path::new("vaultplug.toml"))?;
            assert_eq!(
                config.catalog.plugin_directory.as_deref(),
                Some(Path::new("/from-env"))
            );
            Ok(())
        });
    }

    #[test]
    fn env_overrides_storage_path() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("vaultplug.toml", "")?;
            jail.set_env("VAULTPLUG_STORAGE_DATABASE_PATH", "/var/lib/vaultplug/catalog.db");

            let config = load_config_from_path(Path::new("vaultplug.toml"))?;
            assert_eq!(config.storage.database_path, "/var/lib/vaultplug/catalog.db");
            Ok(())
        });
    }

    #[test]
    fn env_overrides_boolean_flag() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("vaultplug.toml", "[catalog]\nupgrade_on_setup = true\n")?;
            jail.set_env("VAULTPLUG_CATALOG_UPGRADE_ON_SETUP", "false");

            let config = load_config_from_path(Path::new("vaultplug.toml"))?;
            assert!(!config.catalog.upgrade_on_setup);
            Ok(())
        });
    }
}
