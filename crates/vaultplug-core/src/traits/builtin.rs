// SPDX-FileCopyrightText: 2026 Vaultplug Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Builtin plugin registry contract.

use std::any::Any;
use std::sync::Arc;

use crate::error::CatalogError;
use crate::types::PluginType;

/// Factory for a plugin compiled into the host.
pub trait BuiltinFactory: Send + Sync {
    /// Construct an in-process instance of the plugin.
    fn create(&self) -> Result<Box<dyn Any + Send + Sync>, CatalogError>;
}

/// Lookup of compiled-in plugins by name and type.
pub trait BuiltinRegistry: Send + Sync {
    /// Returns the factory for `name` if a builtin of that type exists.
    fn get(&self, name: &str, plugin_type: PluginType) -> Option<Arc<dyn BuiltinFactory>>;

    /// Names of every builtin of the given type.
    fn keys(&self, plugin_type: PluginType) -> Vec<String>;
}
