// SPDX-FileCopyrightText: 2026 Vaultplug Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON encoding of catalog entries.
//!
//! Entries are stored as a JSON object with the fields `name`, `type`
//! (numeric code), `command` (relative to the plugin directory), `args`,
//! `env`, `sha256` (base64) and `builtin`. Legacy entries predate `type`, and
//! older writers emit `null` for empty lists and digests; both decode cleanly.

use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize};

use vaultplug_core::{CatalogError, PluginRunner, PluginType};

#[derive(Debug, Serialize, Deserialize)]
struct PersistedEntry {
    name: String,
    #[serde(rename = "type", default)]
    plugin_type: PluginType,
    command: PathBuf,
    #[serde(default, deserialize_with = "null_as_empty")]
    args: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    env: Vec<String>,
    #[serde(default, with = "base64_digest")]
    sha256: Vec<u8>,
    #[serde(default)]
    builtin: bool,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

mod base64_digest {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(digest: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        if digest.is_empty() {
            serializer.serialize_none()
        } else {
            serializer.serialize_str(&STANDARD.encode(digest))
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(encoded) => STANDARD.decode(encoded.as_bytes()).map_err(D::Error::custom),
            None => Ok(Vec::new()),
        }
    }
}

/// Serialize an external plugin entry for storage.
///
/// The command is written exactly as given, so callers must pass the
/// directory-relative form.
pub fn encode_entry(entry: &PluginRunner) -> Result<Vec<u8>, CatalogError> {
    if entry.builtin {
        return Err(CatalogError::Internal(format!(
            "builtin plugin {} cannot be persisted",
            entry.name
        )));
    }

    let persisted = PersistedEntry {
        name: entry.name.clone(),
        plugin_type: entry.plugin_type,
        command: entry.command.clone(),
        args: entry.args.clone(),
        env: entry.env.clone(),
        sha256: entry.sha256.clone(),
        builtin: false,
    };
    serde_json::to_vec(&persisted).map_err(|source| CatalogError::Codec {
        context: format!("failed to encode plugin entry {:?}", entry.name),
        source,
    })
}

/// Decode the value stored under `key`.
pub fn decode_entry(key: &str, value: &[u8]) -> Result<PluginRunner, CatalogError> {
    let persisted: PersistedEntry =
        serde_json::from_slice(value).map_err(|source| CatalogError::Codec {
            context: format!("failed to decode plugin entry {key:?}"),
            source,
        })?;

    Ok(PluginRunner {
        name: persisted.name,
        plugin_type: persisted.plugin_type,
        command: persisted.command,
        args: persisted.args,
        env: persisted.env,
        sha256: persisted.sha256,
        builtin: persisted.builtin,
        builtin_factory: None,
    })
}
