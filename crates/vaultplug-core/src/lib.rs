// SPDX-FileCopyrightText: 2026 Vaultplug Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the vaultplug plugin catalog.
//!
//! This crate provides the error type, the plugin descriptor types, and the
//! traits for the collaborators the catalog is built on: the durable catalog
//! store, the builtin plugin registry, and the plugin process launcher.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{BoxError, CatalogError, MultiError};
pub use types::{BackendType, PluginRunner, PluginType, ProtocolVersion};

// Re-export all collaborator traits at crate root.
pub use traits::{
    BackendClient, BackendConfig, BuiltinFactory, BuiltinRegistry, CatalogStore, ClientProtocol,
    LaunchOptions, PluginLauncher, PluginProcess, RawConnection, StorageEntry, collect_keys,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_error_sentinels_render() {
        assert_eq!(
            CatalogError::DirectoryNotConfigured.to_string(),
            "could not set plugin, plugin directory is not configured"
        );
        assert_eq!(
            CatalogError::BadPluginType.to_string(),
            "unable to determine plugin type"
        );
        let not_found = CatalogError::PluginNotFound {
            name: "mysql".into(),
            plugin_type: PluginType::Database,
        };
        assert_eq!(
            not_found.to_string(),
            "plugin not found in the catalog: database/mysql"
        );
    }

    #[test]
    fn all_trait_modules_are_exported() {
        fn _assert_store<T: CatalogStore>() {}
        fn _assert_registry<T: BuiltinRegistry>() {}
        fn _assert_launcher<T: PluginLauncher>() {}
        fn _assert_process<T: PluginProcess>() {}
        fn _assert_protocol<T: ClientProtocol>() {}
        fn _assert_backend<T: BackendClient>() {}
        fn _assert_factory<T: BuiltinFactory>() {}
    }
}
