// SPDX-FileCopyrightText: 2026 Vaultplug Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command path checks for external plugins.
//!
//! A registered command must resolve, after following symlinks, to a file
//! whose parent is exactly the plugin directory.

use std::path::{Component, Path, PathBuf};

use vaultplug_core::CatalogError;

/// Reject names or commands that mention `..`.
pub fn reject_parent_references(name: &str, command: &str) -> Result<(), CatalogError> {
    if name.contains("..") || command.contains("..") {
        return Err(CatalogError::PathTraversal);
    }
    Ok(())
}

/// Join `command` under `directory`.
///
/// Root and `.` components of `command` are dropped, so an absolute command
/// is treated as relative to the directory rather than replacing it.
pub fn join_command(directory: &Path, command: &Path) -> PathBuf {
    let mut joined = directory.to_path_buf();
    for component in command.components() {
        match component {
            Component::Prefix(_) | Component::RootDir | Component::CurDir => {}
            Component::ParentDir => joined.push(".."),
            Component::Normal(part) => joined.push(part),
        }
    }
    joined
}

/// Resolve `command` under `directory` and confirm it does not escape it.
///
/// `directory` must already be canonical. Returns the joined, unresolved
/// path on success.
pub async fn validate_command_path(
    directory: &Path,
    command: &Path,
) -> Result<PathBuf, CatalogError> {
    let joined = join_command(directory, command);
    let resolved = tokio::fs::canonicalize(&joined)
        .await
        .map_err(|source| CatalogError::CommandPath {
            path: joined.clone(),
            source,
        })?;

    if resolved.parent() != Some(directory) {
        return Err(CatalogError::UnsafeCommandPath { path: resolved });
    }
    Ok(joined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vaultplug_test_utils::PluginDir;

    #[test]
    fn parent_references_are_rejected() {
        assert!(reject_parent_references("mydb", "mydb-plugin").is_ok());
        assert!(matches!(
            reject_parent_references("../evil", "x"),
            Err(CatalogError::PathTraversal)
        ));
        assert!(matches!(
            reject_parent_references("x", "../../bin/sh"),
            Err(CatalogError::PathTraversal)
        ));
    }

    #[test]
    fn join_treats_absolute_commands_as_relative() {
        let dir = Path::new("/plugins");
        assert_eq!(
            join_command(dir, Path::new("/bin/sh")),
            PathBuf::from("/plugins/bin/sh")
        );
        assert_eq!(
            join_command(dir, Path::new("./mydb")),
            PathBuf::from("/plugins/mydb")
        );
    }

    #[tokio::test]
    async fn file_in_directory_is_accepted() {
        let dir = PluginDir::new().unwrap();
        dir.add_binary("mydb-plugin").unwrap();

        let path = validate_command_path(dir.path(), Path::new("mydb-plugin"))
            .await
            .unwrap();
        assert_eq!(path, dir.path().join("mydb-plugin"));
    }

    #[tokio::test]
    async fn nested_file_is_rejected() {
        let dir = PluginDir::new().unwrap();
        dir.add_subdir("nested").unwrap();
        dir.add_binary("nested/tool").unwrap();

        let err = validate_command_path(dir.path(), Path::new("nested/tool"))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::UnsafeCommandPath { .. }));
    }

    #[tokio::test]
    async fn missing_file_is_a_path_error() {
        let dir = PluginDir::new().unwrap();
        let err = validate_command_path(dir.path(), Path::new("ghost"))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::CommandPath { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn symlink_out_of_directory_is_rejected() {
        let dir = PluginDir::new().unwrap();
        let outside = tempfile::tempdir().unwrap();
        let target = outside.path().join("sh");
        std::fs::write(&target, b"#!/bin/sh\n").unwrap();
        dir.add_symlink("escape", &target).unwrap();

        let err = validate_command_path(dir.path(), Path::new("escape"))
            .await
            .unwrap_err();
        match err {
            CatalogError::UnsafeCommandPath { path } => {
                assert_eq!(path, target.canonicalize().unwrap());
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
