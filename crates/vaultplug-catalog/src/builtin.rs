// SPDX-FileCopyrightText: 2026 Vaultplug Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Registry of compiled-in plugins.
//!
//! `StaticBuiltinRegistry` stores factories keyed by plugin name and type.
//! It is populated once at startup and then handed to the catalog, which only
//! reads from it.

use std::collections::HashMap;
use std::sync::Arc;

use vaultplug_core::{BuiltinFactory, BuiltinRegistry, PluginType};

/// A single registered builtin.
#[derive(Clone)]
pub struct BuiltinEntry {
    pub name: String,
    pub plugin_type: PluginType,
    pub factory: Arc<dyn BuiltinFactory>,
}

impl std::fmt::Debug for BuiltinEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuiltinEntry")
            .field("name", &self.name)
            .field("plugin_type", &self.plugin_type)
            .finish_non_exhaustive()
    }
}

/// In-memory builtin registry.
#[derive(Debug, Default)]
pub struct StaticBuiltinRegistry {
    entries: HashMap<(PluginType, String), BuiltinEntry>,
}

impl StaticBuiltinRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a builtin, replacing any previous one with the same name and type.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        plugin_type: PluginType,
        factory: Arc<dyn BuiltinFactory>,
    ) {
        let name = name.into();
        self.entries.insert(
            (plugin_type, name.clone()),
            BuiltinEntry {
                name,
                plugin_type,
                factory,
            },
        );
    }

    /// Builder-style [`register`](Self::register).
    #[must_use]
    pub fn with(
        mut self,
        name: impl Into<String>,
        plugin_type: PluginType,
        factory: Arc<dyn BuiltinFactory>,
    ) -> Self {
        self.register(name, plugin_type, factory);
        self
    }

    /// All entries, sorted by type then name.
    pub fn list_all(&self) -> Vec<&BuiltinEntry> {
        let mut entries: Vec<&BuiltinEntry> = self.entries.values().collect();
        entries.sort_by(|a, b| (a.plugin_type, &a.name).cmp(&(b.plugin_type, &b.name)));
        entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl BuiltinRegistry for StaticBuiltinRegistry {
    fn get(&self, name: &str, plugin_type: PluginType) -> Option<Arc<dyn BuiltinFactory>> {
        self.entries
            .get(&(plugin_type, name.to_string()))
            .map(|entry| Arc::clone(&entry.factory))
    }

    fn keys(&self, plugin_type: PluginType) -> Vec<String> {
        let mut names: Vec<String> = self
            .entries
            .values()
            .filter(|entry| entry.plugin_type == plugin_type)
            .map(|entry| entry.name.clone())
            .collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vaultplug_test_utils::MockBuiltinFactory;

    fn registry() -> StaticBuiltinRegistry {
        StaticBuiltinRegistry::new()
            .with("postgres", PluginType::Database, MockBuiltinFactory::new("postgres"))
            .with("mysql", PluginType::Database, MockBuiltinFactory::new("mysql"))
            .with("userpass", PluginType::Credential, MockBuiltinFactory::new("userpass"))
    }

    #[test]
    fn lookup_is_scoped_by_type() {
        let reg = registry();
        assert!(reg.get("mysql", PluginType::Database).is_some());
        assert!(reg.get("mysql", PluginType::Secrets).is_none());
        assert!(reg.get("nope", PluginType::Database).is_none());
    }

    #[test]
    fn keys_are_sorted_per_type() {
        let reg = registry();
        assert_eq!(reg.keys(PluginType::Database), vec!["mysql", "postgres"]);
        assert_eq!(reg.keys(PluginType::Credential), vec!["userpass"]);
        assert!(reg.keys(PluginType::Secrets).is_empty());
    }

    #[test]
    fn register_replaces_same_name_and_type() {
        let mut reg = registry();
        reg.register("mysql", PluginType::Database, MockBuiltinFactory::new("mysql2"));
        assert_eq!(reg.len(), 3);

        let instance = reg
            .get("mysql", PluginType::Database)
            .unwrap()
            .create()
            .unwrap();
        assert_eq!(instance.downcast_ref::<String>().unwrap(), "mysql2");
    }

    #[test]
    fn list_all_orders_by_type_then_name() {
        let reg = registry();
        let names: Vec<&str> = reg.list_all().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["userpass", "mysql", "postgres"]);
    }
}
