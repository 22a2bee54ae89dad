// SPDX-FileCopyrightText: 2026 Vaultplug Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Catalog store implementations.
//!
//! - [`MemoryStore`]: process-local map, used by tests and ephemeral setups.
//! - [`SqliteStore`]: durable store on a single-writer `tokio-rusqlite`
//!   connection with embedded migrations.
//! - [`PrefixedStore`]: view that re-roots any store under a fixed prefix.

pub mod keys;
pub mod memory;
pub mod migrations;
pub mod prefixed;
pub mod sqlite;

pub use memory::MemoryStore;
pub use prefixed::PrefixedStore;
pub use sqlite::SqliteStore;
