// SPDX-FileCopyrightText: 2026 Vaultplug Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin descriptor types shared by the catalog and its collaborators.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum::{Display, EnumString};

use crate::traits::builtin::BuiltinFactory;

/// Capability class of a plugin.
///
/// Persisted as a numeric code; rendered with the canonical names used as
/// storage key prefixes (`auth/`, `database/`, `secret/`).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString,
)]
pub enum PluginType {
    #[default]
    #[strum(serialize = "unknown")]
    Unknown,
    #[strum(serialize = "auth")]
    Credential,
    #[strum(serialize = "database")]
    Database,
    #[strum(serialize = "secret")]
    Secrets,
}

impl PluginType {
    /// Every type, in code order.
    pub const ALL: [PluginType; 4] = [
        PluginType::Unknown,
        PluginType::Credential,
        PluginType::Database,
        PluginType::Secrets,
    ];

    /// Numeric code written to the catalog store.
    pub fn code(self) -> u32 {
        match self {
            PluginType::Unknown => 0,
            PluginType::Credential => 1,
            PluginType::Database => 2,
            PluginType::Secrets => 3,
        }
    }

    /// Inverse of [`PluginType::code`].
    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.code() == code)
    }

    /// Key prefix under which entries of this type are stored.
    pub fn key_prefix(self) -> String {
        format!("{self}/")
    }
}

impl Serialize for PluginType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.code())
    }
}

impl<'de> Deserialize<'de> for PluginType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = u32::deserialize(deserializer)?;
        PluginType::from_code(code)
            .ok_or_else(|| D::Error::custom(format!("unknown plugin type code {code}")))
    }
}

/// Kind of backend a generic backend plugin declares about itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum BackendType {
    Unknown,
    Logical,
    Credential,
}

impl BackendType {
    /// Catalog type a backend kind maps to, if any.
    pub fn plugin_type(self) -> Option<PluginType> {
        match self {
            BackendType::Credential => Some(PluginType::Credential),
            BackendType::Logical => Some(PluginType::Secrets),
            BackendType::Unknown => None,
        }
    }
}

/// Handshake protocol family a plugin binary may speak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ProtocolVersion {
    /// Current database plugin protocol.
    #[strum(serialize = "database-v5")]
    DatabaseV5,
    /// Deprecated database plugin protocol.
    #[strum(serialize = "database-v4")]
    DatabaseV4,
    /// Generic secrets/auth backend protocol.
    #[strum(serialize = "backend")]
    Backend,
}

/// Descriptor of a registered plugin.
///
/// `command` is relative to the plugin directory when persisted and absolute
/// once handed out by the catalog. Builtin runners have an empty command and
/// carry a factory instead.
#[derive(Clone, Default)]
pub struct PluginRunner {
    pub name: String,
    pub plugin_type: PluginType,
    pub command: PathBuf,
    pub args: Vec<String>,
    pub env: Vec<String>,
    pub sha256: Vec<u8>,
    pub builtin: bool,
    pub builtin_factory: Option<Arc<dyn BuiltinFactory>>,
}

impl PluginRunner {
    /// Descriptor for an external plugin binary.
    pub fn external(
        name: impl Into<String>,
        plugin_type: PluginType,
        command: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            plugin_type,
            command: command.into(),
            ..Default::default()
        }
    }

    /// Descriptor backed by a compiled-in factory.
    pub fn builtin(
        name: impl Into<String>,
        plugin_type: PluginType,
        factory: Arc<dyn BuiltinFactory>,
    ) -> Self {
        Self {
            name: name.into(),
            plugin_type,
            builtin: true,
            builtin_factory: Some(factory),
            ..Default::default()
        }
    }
}

impl fmt::Debug for PluginRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRunner")
            .field("name", &self.name)
            .field("plugin_type", &self.plugin_type)
            .field("command", &self.command)
            .field("args", &self.args)
            .field("env", &self.env.len())
            .field("sha256", &self.sha256.len())
            .field("builtin", &self.builtin)
            .field("builtin_factory", &self.builtin_factory.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn plugin_type_names_match_key_prefixes() {
        assert_eq!(PluginType::Credential.to_string(), "auth");
        assert_eq!(PluginType::Secrets.to_string(), "secret");
        assert_eq!(PluginType::Database.key_prefix(), "database/");
        assert_eq!(PluginType::Unknown.to_string(), "unknown");
    }

    #[test]
    fn plugin_type_parses_canonical_names() {
        for t in PluginType::ALL {
            let parsed = PluginType::from_str(&t.to_string()).expect("should parse back");
            assert_eq!(t, parsed);
        }
        assert!(PluginType::from_str("credential").is_err());
    }

    #[test]
    fn plugin_type_serializes_as_code() {
        let json = serde_json::to_string(&PluginType::Database).unwrap();
        assert_eq!(json, "2");
        let parsed: PluginType = serde_json::from_str("1").unwrap();
        assert_eq!(parsed, PluginType::Credential);
        assert!(serde_json::from_str::<PluginType>("9").is_err());
    }

    #[test]
    fn backend_type_maps_to_plugin_type() {
        assert_eq!(
            BackendType::Credential.plugin_type(),
            Some(PluginType::Credential)
        );
        assert_eq!(BackendType::Logical.plugin_type(), Some(PluginType::Secrets));
        assert_eq!(BackendType::Unknown.plugin_type(), None);
    }

    #[test]
    fn runner_debug_hides_env_values() {
        let mut runner = PluginRunner::external("mydb", PluginType::Database, "mydb-plugin");
        runner.env = vec!["DB_PASSWORD=hunter2".into()];
        let rendered = format!("{runner:?}");
        assert!(!rendered.contains("hunter2"));
    }

    proptest::proptest! {
        #[test]
        fn plugin_type_code_roundtrip(code in 0u32..16) {
            match PluginType::from_code(code) {
                Some(t) => proptest::prop_assert_eq!(t.code(), code),
                None => proptest::prop_assert!(code > 3),
            }
        }
    }
}
