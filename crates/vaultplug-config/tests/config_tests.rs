// SPDX-FileCopyrightText: 2026 Vaultplug Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the vaultplug configuration system.

use std::path::Path;

use vaultplug_config::diagnostic::ConfigError;
use vaultplug_config::{load_and_validate_str, load_config_from_str};

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_config() {
    let toml = r#"
[catalog]
plugin_directory = "/opt/vault/plugins"
upgrade_on_setup = false

[storage]
database_path = "/tmp/catalog.db"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(
        config.catalog.plugin_directory.as_deref(),
        Some(Path::new("/opt/vault/plugins"))
    );
    assert!(!config.catalog.upgrade_on_setup);
    assert_eq!(config.storage.database_path, "/tmp/catalog.db");
}

/// An empty document yields the compiled defaults.
#[test]
fn empty_toml_uses_defaults() {
    let config = load_config_from_str("").expect("empty TOML should deserialize");
    assert!(config.catalog.plugin_directory.is_none());
    assert!(config.catalog.upgrade_on_setup);
    assert!(!config.storage.database_path.is_empty());
}

/// Unknown field in [catalog] produces an UnknownKey error with a suggestion.
#[test]
fn unknown_field_in_catalog_produces_suggestion() {
    let toml = r#"
[catalog]
plugin_dirctory = "/plugins"
"#;

    let errors = load_and_validate_str(toml).unwrap_err();
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        ConfigError::UnknownKey {
            key, suggestion, ..
        } => {
            assert_eq!(key, "plugin_dirctory");
            assert_eq!(suggestion.as_deref(), Some("plugin_directory"));
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

/// Wrong value type is reported as InvalidType.
#[test]
fn wrong_type_produces_invalid_type() {
    let toml = r#"
[catalog]
upgrade_on_setup = [1, 2]
"#;

    let errors = load_and_validate_str(toml).unwrap_err();
    assert!(matches!(errors[0], ConfigError::InvalidType { .. }));
}

/// Semantic validation runs after deserialization.
#[test]
fn relative_plugin_directory_fails_validation() {
    let toml = r#"
[catalog]
plugin_directory = "plugins"
"#;

    let errors = load_and_validate_str(toml).unwrap_err();
    assert!(matches!(errors[0], ConfigError::Validation { .. }));
}
