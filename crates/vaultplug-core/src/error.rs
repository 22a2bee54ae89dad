// SPDX-FileCopyrightText: 2026 Vaultplug Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the vaultplug plugin catalog.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::types::PluginType;

/// Boxed error used for sources coming from external collaborators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The primary error type used across the catalog and its collaborator traits.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// No plugin directory is configured, so external plugins cannot be registered.
    #[error("could not set plugin, plugin directory is not configured")]
    DirectoryNotConfigured,

    /// The requested plugin does not exist in the catalog.
    #[error("plugin not found in the catalog: {plugin_type}/{name}")]
    PluginNotFound {
        name: String,
        plugin_type: PluginType,
    },

    /// Type detection could not classify the plugin binary.
    #[error("unable to determine plugin type")]
    BadPluginType,

    /// A plugin name or command contained a parent directory reference.
    #[error("path cannot contain parent references")]
    PathTraversal,

    /// The resolved command escapes the configured plugin directory.
    #[error("cannot execute files outside of configured plugin directory: {}", .path.display())]
    UnsafeCommandPath { path: PathBuf },

    /// The command path could not be resolved on the filesystem.
    #[error("error while validating the command path {}: {source}", .path.display())]
    CommandPath {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The configured plugin directory could not be resolved.
    #[error("plugin directory {} is not accessible: {source}", .path.display())]
    Directory {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Catalog store errors (lookup, write, enumeration).
    #[error("storage error: {context}: {source}")]
    Storage { context: String, source: BoxError },

    /// A catalog entry could not be encoded or decoded.
    #[error("{context}: {source}")]
    Codec {
        context: String,
        source: serde_json::Error,
    },

    /// The plugin process could not be started or did not complete its handshake.
    #[error("failed to launch plugin {name}: {message}")]
    Launch {
        name: String,
        message: String,
        source: Option<BoxError>,
    },

    /// An RPC against a running plugin failed.
    #[error("plugin rpc error: {message}")]
    Rpc {
        message: String,
        source: Option<BoxError>,
    },

    /// The operation was cancelled before it completed.
    #[error("operation cancelled: {0}")]
    Cancelled(String),

    /// A pooled connection was released more times than it was acquired.
    #[error("connection for plugin {name} released more times than it was acquired")]
    ConnectionNotHeld { name: String },

    /// A single legacy entry could not be upgraded.
    #[error("could not upgrade plugin {name}: {source}")]
    UpgradeEntry {
        name: String,
        source: Box<CatalogError>,
    },

    /// One or more legacy entries could not be upgraded.
    #[error("could not upgrade plugins: {0}")]
    Upgrade(MultiError),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CatalogError {
    /// Wrap a collaborator failure with the operation and key it happened on.
    pub fn storage<E>(context: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        CatalogError::Storage {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Build a launch error without an underlying source.
    pub fn launch(name: impl Into<String>, message: impl Into<String>) -> Self {
        CatalogError::Launch {
            name: name.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Build an RPC error without an underlying source.
    pub fn rpc(message: impl Into<String>) -> Self {
        CatalogError::Rpc {
            message: message.into(),
            source: None,
        }
    }
}

/// An ordered collection of errors reported as one.
///
/// Used where a sweep keeps going after individual failures and reports
/// everything it hit at the end.
#[derive(Debug, Default)]
pub struct MultiError {
    errors: Vec<CatalogError>,
}

impl MultiError {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an error.
    pub fn push(&mut self, err: CatalogError) {
        self.errors.push(err);
    }

    /// Returns true if no errors were collected.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the number of collected errors.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// The collected errors in insertion order.
    pub fn errors(&self) -> &[CatalogError] {
        &self.errors
    }
}

impl fmt::Display for MultiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.errors.len() {
            0 => write!(f, "no errors"),
            1 => write!(f, "1 error occurred: {}", self.errors[0]),
            n => {
                write!(f, "{n} errors occurred:")?;
                for err in &self.errors {
                    write!(f, "\n\t* {err}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for MultiError {}

impl From<CatalogError> for MultiError {
    fn from(err: CatalogError) -> Self {
        Self { errors: vec![err] }
    }
}
