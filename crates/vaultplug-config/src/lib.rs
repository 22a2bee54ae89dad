// SPDX-FileCopyrightText: 2026 Vaultplug Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the vaultplug plugin catalog.
//!
//! Provides TOML configuration parsing with strict validation (`deny_unknown_fields`),
//! XDG file hierarchy lookup, `VAULTPLUG_` environment variable overrides, and
//! miette diagnostics with typo suggestions.
//!
//! # Usage
//!
//! ```no_run
//! use vaultplug_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("plugin directory: {:?}", config.catalog.plugin_directory);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{ConfigError, render_errors, render_report};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{CatalogConfig, StorageConfig, VaultplugConfig};

/// Load configuration from the XDG hierarchy and validate it.
///
/// Returns either a valid `VaultplugConfig` or every diagnostic collected.
pub fn load_and_validate() -> Result<VaultplugConfig, Vec<ConfigError>> {
    match loader::load_config() {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(err)),
    }
}

/// Load configuration from a TOML string and validate it.
///
/// Useful for testing and explicit configuration.
pub fn load_and_validate_str(toml_content: &str) -> Result<VaultplugConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(err)),
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn load_and_validate_reads_local_file() {
        figment::Jail::expect_with(|jail| {
            let home = jail.directory().display().to_string();
            jail.set_env("HOME", &home);
            jail.set_env("XDG_CONFIG_HOME", &home);
            jail.create_file(
                "vaultplug.toml",
                "[catalog]\nplugin_directory = \"/opt/plugins\"\n",
            )?;

            let config = load_and_validate().expect("config should validate");
            assert_eq!(
                config.catalog.plugin_directory.as_deref(),
                Some(Path::new("/opt/plugins"))
            );
            Ok(())
        });
    }

    #[test]
    fn load_and_validate_reports_bad_env() {
        figment::Jail::expect_with(|jail| {
            let home = jail.directory().display().to_string();
            jail.set_env("HOME", &home);
            jail.set_env("XDG_CONFIG_HOME", &home);
            jail.set_env("VAULTPLUG_CATALOG_PLUGIN_DIRECTORY", "relative/plugins");

            let errors = load_and_validate().unwrap_err();
            assert_eq!(errors.len(), 1);
            assert!(matches!(errors[0], ConfigError::Validation { .. }));
            Ok(())
        });
    }
}
