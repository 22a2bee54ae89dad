// SPDX-FileCopyrightText: 2026 Vaultplug Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Temporary plugin directories.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A throwaway plugin directory populated with placeholder executables.
///
/// The path is canonicalized so it compares equal to what the catalog
/// resolves commands against.
pub struct PluginDir {
    // Held for its Drop; removes the directory.
    _dir: TempDir,
    path: PathBuf,
}

impl PluginDir {
    pub fn new() -> io::Result<Self> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().canonicalize()?;
        Ok(Self { _dir: dir, path })
    }

    /// Canonical directory path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create an executable placeholder named `file_name`.
    pub fn add_binary(&self, file_name: &str) -> io::Result<PathBuf> {
        let path = self.path.join(file_name);
        fs::write(&path, b"#!/bin/sh\nexit 0\n")?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755))?;
        }
        Ok(path)
    }

    /// Create a symlink named `link_name` inside the directory pointing at `target`.
    #[cfg(unix)]
    pub fn add_symlink(&self, link_name: &str, target: &Path) -> io::Result<PathBuf> {
        let path = self.path.join(link_name);
        std::os::unix::fs::symlink(target, &path)?;
        Ok(path)
    }

    /// Create a subdirectory and return its path.
    pub fn add_subdir(&self, name: &str) -> io::Result<PathBuf> {
        let path = self.path.join(name);
        fs::create_dir_all(&path)?;
        Ok(path)
    }
}
