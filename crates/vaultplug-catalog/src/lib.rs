// SPDX-FileCopyrightText: 2026 Vaultplug Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed plugin catalog.
//!
//! The [`Catalog`] maps `(name, type)` pairs to runnable plugin descriptors.
//! Stored registrations of external binaries take precedence over plugins
//! compiled into the host. External binaries must live directly inside the
//! configured plugin directory, and their type is detected by starting them
//! when it is not given.
//!
//! Running plugin processes are shared: [`Catalog::acquire`] hands out a
//! [`MultiplexedClient`] lease on the single process per plugin name, which
//! is killed when the last lease is closed.

pub mod builtin;
pub mod catalog;
pub mod codec;
mod detect;
pub mod pool;
pub mod security;
pub mod upgrade;

pub use builtin::{BuiltinEntry, StaticBuiltinRegistry};
pub use catalog::{Catalog, PLUGIN_CATALOG_PATH};
pub use pool::{ConnectionPool, MultiplexedClient, POOL_ID_LENGTH};
pub use upgrade::UpgradeReport;
