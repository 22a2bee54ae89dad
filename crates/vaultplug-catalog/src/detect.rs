// SPDX-FileCopyrightText: 2026 Vaultplug Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin type detection.
//!
//! A binary of unknown type is started in metadata mode under each protocol
//! in turn: the current database protocol (through the pool), the deprecated
//! database protocol (a direct launch), then the generic backend protocol.
//! The first handshake that succeeds decides the type.

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use vaultplug_core::{
    BackendConfig, CatalogError, LaunchOptions, MultiError, PluginLauncher, PluginRunner,
    PluginType, ProtocolVersion,
};

use crate::pool::{ConnectionPool, start_process};

const DETECTION_LOG_NAME: &str = "plugin-type-detection";

pub(crate) struct TypeDetector<'a> {
    pub pool: &'a ConnectionPool,
    pub launcher: &'a dyn PluginLauncher,
    pub cancel: &'a CancellationToken,
}

impl TypeDetector<'_> {
    /// Classify `runner`, whose command must be absolute.
    ///
    /// Returns [`PluginType::Unknown`] when no protocol matched. Cancellation
    /// and a backend that starts but fails setup are reported as errors.
    pub async fn detect(&self, runner: &PluginRunner) -> Result<PluginType, CatalogError> {
        let mut diagnostics = MultiError::new();

        match self.try_database_v5(runner).await {
            Ok(()) => return Ok(PluginType::Database),
            Err(err @ CatalogError::Cancelled(_)) => return Err(err),
            Err(err) => diagnostics.push(attempt_failed(runner, ProtocolVersion::DatabaseV5, err)),
        }

        match self.try_database_v4(runner).await {
            Ok(()) => return Ok(PluginType::Database),
            Err(err @ CatalogError::Cancelled(_)) => return Err(err),
            Err(err) => diagnostics.push(attempt_failed(runner, ProtocolVersion::DatabaseV4, err)),
        }

        let options = LaunchOptions::new(ProtocolVersion::Backend, DETECTION_LOG_NAME)
            .metadata_mode(true);
        let launched = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            result = self.launcher.backend_client(runner, &options) => Some(result),
        };
        match launched {
            None => {
                return Err(CatalogError::Cancelled(format!(
                    "type detection of plugin {} was cancelled",
                    runner.name
                )));
            }
            Some(Err(err)) => diagnostics.push(attempt_failed(runner, ProtocolVersion::Backend, err)),
            Some(Ok(mut client)) => {
                let setup = client.setup(&BackendConfig::default()).await;
                let backend_type = client.backend_type();
                client.cleanup().await;
                setup?;

                if let Some(plugin_type) = backend_type.plugin_type() {
                    debug!(name = %runner.name, %plugin_type, "detected backend plugin");
                    return Ok(plugin_type);
                }
                diagnostics.push(CatalogError::launch(
                    &runner.name,
                    format!("backend declared unsupported type {backend_type}"),
                ));
            }
        }

        warn!(name = %runner.name, error = %diagnostics, "unknown plugin type");
        Ok(PluginType::Unknown)
    }

    async fn try_database_v5(&self, runner: &PluginRunner) -> Result<(), CatalogError> {
        let options = LaunchOptions::new(ProtocolVersion::DatabaseV5, DETECTION_LOG_NAME)
            .metadata_mode(true);
        let lease = self
            .pool
            .acquire(self.launcher, runner, &options, self.cancel)
            .await?;
        if let Err(err) = lease.close().await {
            debug!(name = %runner.name, error = %err, "error closing detection client");
        }
        Ok(())
    }

    async fn try_database_v4(&self, runner: &PluginRunner) -> Result<(), CatalogError> {
        let options = LaunchOptions::new(ProtocolVersion::DatabaseV4, DETECTION_LOG_NAME)
            .metadata_mode(true);
        let (process, protocol) =
            start_process(self.launcher, runner, &options, self.cancel).await?;
        if let Err(err) = protocol.close().await {
            debug!(name = %runner.name, error = %err, "error closing detection client");
        }
        process.kill().await;
        Ok(())
    }
}

fn attempt_failed(
    runner: &PluginRunner,
    protocol: ProtocolVersion,
    err: CatalogError,
) -> CatalogError {
    CatalogError::Launch {
        name: runner.name.clone(),
        message: format!("failed to load plugin as {protocol}: {err}"),
        source: Some(Box::new(err)),
    }
}
