// SPDX-FileCopyrightText: 2026 Vaultplug Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin launcher contract.
//!
//! The launcher forks/execs a plugin binary, verifies its checksum, and
//! performs the handshake. The catalog only consumes the result: a process
//! handle that hands out a typed RPC client and can be killed.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::CatalogError;
use crate::types::{BackendType, PluginRunner, ProtocolVersion};

/// Underlying transport connection exposed by some RPC clients.
pub type RawConnection = Arc<dyn Any + Send + Sync>;

/// How a plugin process should be started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOptions {
    /// Protocol family to negotiate during the handshake.
    pub protocol: ProtocolVersion,
    /// Run the plugin for self-description only.
    pub metadata_mode: bool,
    /// Negotiate a mutually authenticated TLS transport automatically.
    pub auto_mtls: bool,
    /// Name of the tracing span plugin output is logged under.
    pub log_name: String,
}

impl LaunchOptions {
    pub fn new(protocol: ProtocolVersion, log_name: impl Into<String>) -> Self {
        Self {
            protocol,
            metadata_mode: false,
            auto_mtls: true,
            log_name: log_name.into(),
        }
    }

    #[must_use]
    pub fn metadata_mode(mut self, metadata_mode: bool) -> Self {
        self.metadata_mode = metadata_mode;
        self
    }
}

/// Configuration passed to a backend plugin's setup call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendConfig {
    pub config: HashMap<String, String>,
}

/// Starts plugin processes.
#[async_trait]
pub trait PluginLauncher: Send + Sync {
    /// Spawn the plugin described by `runner` and complete the handshake.
    async fn launch(
        &self,
        runner: &PluginRunner,
        options: &LaunchOptions,
    ) -> Result<Arc<dyn PluginProcess>, CatalogError>;

    /// Start `runner` as a generic backend plugin and return its client.
    async fn backend_client(
        &self,
        runner: &PluginRunner,
        options: &LaunchOptions,
    ) -> Result<Box<dyn BackendClient>, CatalogError>;
}

/// Lifecycle handle of a running plugin process.
#[async_trait]
pub trait PluginProcess: Send + Sync {
    /// The RPC client for this process.
    ///
    /// The first call establishes it; later calls return the same handle.
    async fn client(&self) -> Result<Arc<dyn ClientProtocol>, CatalogError>;

    /// Terminate the process.
    async fn kill(&self);
}

/// A live RPC session with a plugin process.
#[async_trait]
pub trait ClientProtocol: Send + Sync {
    /// Obtain the named service implementation from the plugin.
    async fn dispense(&self, service: &str) -> Result<Box<dyn Any + Send + Sync>, CatalogError>;

    /// Liveness check.
    async fn ping(&self) -> Result<(), CatalogError>;

    /// Close the logical RPC session. Does not necessarily stop the process.
    async fn close(&self) -> Result<(), CatalogError>;

    /// The transport connection behind this client, if the transport has one.
    fn raw_connection(&self) -> Option<RawConnection> {
        None
    }
}

/// Client for a generic secrets or auth backend plugin.
#[async_trait]
pub trait BackendClient: Send + Sync {
    async fn setup(&mut self, config: &BackendConfig) -> Result<(), CatalogError>;

    /// Kind of backend the plugin declared during setup.
    fn backend_type(&self) -> BackendType;

    /// Tear the backend down, stopping its process.
    async fn cleanup(&mut self);
}
