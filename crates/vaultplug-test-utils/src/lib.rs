// SPDX-FileCopyrightText: 2026 Vaultplug Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for vaultplug integration tests.
//!
//! Provides mock collaborators so catalog behavior can be exercised without
//! spawning real plugin binaries.
//!
//! # Components
//!
//! - [`MockLauncher`] - launcher whose "binaries" are declared by file name
//! - [`LaunchStats`] - counters shared by every process a mock launcher starts
//! - [`PluginDir`] - temporary plugin directory with placeholder executables
//! - [`FailingStore`] - catalog store whose every call fails

pub mod mock_launcher;
pub mod plugin_dir;
pub mod store;

pub use mock_launcher::{LaunchStats, MockBuiltinFactory, MockLauncher, MockPluginKind};
pub use plugin_dir::PluginDir;
pub use store::FailingStore;
