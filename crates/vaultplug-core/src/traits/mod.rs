// SPDX-FileCopyrightText: 2026 Vaultplug Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits the plugin catalog is built on.
//!
//! The catalog owns none of these: it is handed a store, a builtin registry,
//! and a launcher at construction time. Async traits use `#[async_trait]` for
//! dynamic dispatch compatibility.

pub mod builtin;
pub mod launcher;
pub mod store;

pub use builtin::{BuiltinFactory, BuiltinRegistry};
pub use launcher::{
    BackendClient, BackendConfig, ClientProtocol, LaunchOptions, PluginLauncher, PluginProcess,
    RawConnection,
};
pub use store::{CatalogStore, StorageEntry, collect_keys};
