// SPDX-FileCopyrightText: 2026 Vaultplug Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use crate::diagnostic::ConfigError;
use crate::model::VaultplugConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every validation error instead of failing fast.
pub fn validate_config(config: &VaultplugConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if let Some(dir) = &config.catalog.plugin_directory {
        if dir.as_os_str().is_empty() {
            errors.push(ConfigError::Validation {
                message: "catalog.plugin_directory must not be empty when set".to_string(),
            });
        } else if !dir.is_absolute() {
            errors.push(ConfigError::Validation {
                message: format!(
                    "catalog.plugin_directory must be an absolute path, got `{}`",
                    dir.display()
                ),
            });
        }
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
