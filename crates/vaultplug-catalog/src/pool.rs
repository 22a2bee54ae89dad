// SPDX-FileCopyrightText: 2026 Vaultplug Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Multiplexed plugin processes.
//!
//! At most one process runs per plugin name. Every acquisition bumps the
//! slot's connection count and hands out a [`MultiplexedClient`] lease; the
//! process is killed when the last lease is closed.
//!
//! Each slot has its own async mutex. The slot table itself sits behind a
//! short-lived sync mutex that is never held across an await.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex as SyncMutex, PoisonError};

use rand::Rng;
use rand::distributions::Alphanumeric;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use vaultplug_core::{
    CatalogError, ClientProtocol, LaunchOptions, PluginLauncher, PluginProcess, PluginRunner,
    RawConnection,
};

/// Length of a pool entry id.
pub const POOL_ID_LENGTH: usize = 10;

#[derive(Default)]
struct PoolSlot {
    id: String,
    connection_count: usize,
    process: Option<Arc<dyn PluginProcess>>,
    protocol: Option<Arc<dyn ClientProtocol>>,
    conn: Option<RawConnection>,
}

/// Table of running plugin processes keyed by plugin name.
#[derive(Default)]
pub struct ConnectionPool {
    slots: SyncMutex<HashMap<String, Arc<Mutex<PoolSlot>>>>,
}

impl ConnectionPool {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, name: &str) -> Arc<Mutex<PoolSlot>> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(slot) = slots.get(name) {
            return Arc::clone(slot);
        }
        let slot = Arc::new(Mutex::new(PoolSlot::default()));
        slots.insert(name.to_string(), Arc::clone(&slot));
        slot
    }

    /// Lease a connection to `runner`'s process, starting it if none is running.
    pub async fn acquire(
        &self,
        launcher: &dyn PluginLauncher,
        runner: &PluginRunner,
        options: &LaunchOptions,
        cancel: &CancellationToken,
    ) -> Result<MultiplexedClient, CatalogError> {
        let handle = self.slot(&runner.name);
        let mut slot = handle.lock().await;

        if slot.process.is_some() {
            debug!(name = %runner.name, id = %slot.id, "multiplexed client exists");
        } else {
            debug!(name = %runner.name, "multiplexed client does not exist, spawning plugin process");
            let (process, protocol) = start_process(launcher, runner, options, cancel).await?;
            slot.id = pool_id();
            slot.conn = protocol.raw_connection();
            slot.process = Some(process.disarm());
            slot.protocol = Some(protocol);
        }

        let Some(protocol) = slot.protocol.clone() else {
            return Err(CatalogError::Internal(format!(
                "pool slot for plugin {} has a process but no client",
                runner.name
            )));
        };
        slot.connection_count += 1;
        debug!(
            name = %runner.name,
            id = %slot.id,
            connections = slot.connection_count,
            "acquired multiplexed client connection"
        );

        Ok(MultiplexedClient {
            name: runner.name.clone(),
            id: slot.id.clone(),
            protocol,
            conn: slot.conn.clone(),
            slot: Arc::clone(&handle),
            released: false,
        })
    }

    /// Number of open leases on `name`'s process.
    pub async fn connection_count(&self, name: &str) -> usize {
        let slot = {
            let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            slots.get(name).cloned()
        };
        match slot {
            Some(slot) => slot.lock().await.connection_count,
            None => 0,
        }
    }
}

/// A freshly launched process that has not been handed off yet.
///
/// Dropping an armed guard kills the process on a spawned task, so a caller
/// abandoning the launch future mid-handshake does not leak it.
pub(crate) struct ProcessGuard {
    process: Arc<dyn PluginProcess>,
    armed: bool,
}

impl ProcessGuard {
    fn new(process: Arc<dyn PluginProcess>) -> Self {
        Self {
            process,
            armed: true,
        }
    }

    /// Hand the process off; the caller now owns its lifetime.
    pub(crate) fn disarm(mut self) -> Arc<dyn PluginProcess> {
        self.armed = false;
        Arc::clone(&self.process)
    }

    pub(crate) async fn kill(mut self) {
        self.armed = false;
        self.process.kill().await;
    }
}

impl Drop for ProcessGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let process = Arc::clone(&self.process);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                debug!("launch abandoned, killing plugin process");
                handle.spawn(async move { process.kill().await });
            }
            Err(_) => error!("launch abandoned outside a runtime, plugin process left running"),
        }
    }
}

/// Launch a process and establish its client.
///
/// Cancellation is checked before launching and while each step is pending.
/// A process that was started is killed if the client cannot be obtained,
/// including when this future is dropped before it completes.
pub(crate) async fn start_process(
    launcher: &dyn PluginLauncher,
    runner: &PluginRunner,
    options: &LaunchOptions,
    cancel: &CancellationToken,
) -> Result<(ProcessGuard, Arc<dyn ClientProtocol>), CatalogError> {
    let launched = tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        result = launcher.launch(runner, options) => Some(result),
    };
    let Some(launched) = launched else {
        return Err(cancelled(&runner.name));
    };
    let process = ProcessGuard::new(launched?);

    let connected = tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        result = process.process.client() => Some(result),
    };
    match connected {
        Some(Ok(protocol)) => Ok((process, protocol)),
        Some(Err(err)) => {
            process.kill().await;
            Err(err)
        }
        None => {
            process.kill().await;
            Err(cancelled(&runner.name))
        }
    }
}

fn cancelled(name: &str) -> CatalogError {
    CatalogError::Cancelled(format!("start of plugin {name} was cancelled"))
}

fn pool_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(POOL_ID_LENGTH)
        .map(char::from)
        .collect()
}

/// A lease on a pooled plugin process.
///
/// Should be given back with [`close`](Self::close). A lease dropped without
/// closing is released on a spawned task instead, so its close error is lost
/// and the process may outlive the drop briefly. Outside a tokio runtime
/// nothing can be spawned and the connection count stays raised.
pub struct MultiplexedClient {
    name: String,
    id: String,
    protocol: Arc<dyn ClientProtocol>,
    conn: Option<RawConnection>,
    slot: Arc<Mutex<PoolSlot>>,
    released: bool,
}

impl MultiplexedClient {
    /// Id of the process this lease is on. Shared by all concurrent leases.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn protocol(&self) -> &Arc<dyn ClientProtocol> {
        &self.protocol
    }

    /// Raw transport connection, when the protocol exposes one.
    pub fn conn(&self) -> Option<&RawConnection> {
        self.conn.as_ref()
    }

    pub async fn dispense(&self, service: &str) -> Result<Box<dyn Any + Send + Sync>, CatalogError> {
        self.protocol.dispense(service).await
    }

    pub async fn ping(&self) -> Result<(), CatalogError> {
        self.protocol.ping().await
    }

    /// Give the lease back.
    ///
    /// Closes the RPC session and, when this was the last lease, kills the
    /// process. The process is killed even if closing the session failed;
    /// that failure is still returned.
    pub async fn close(mut self) -> Result<(), CatalogError> {
        self.released = true;
        release(&self.slot, &self.name, &self.id, &self.protocol).await
    }
}

async fn release(
    slot: &Mutex<PoolSlot>,
    name: &str,
    id: &str,
    protocol: &Arc<dyn ClientProtocol>,
) -> Result<(), CatalogError> {
    let mut slot = slot.lock().await;

    if slot.connection_count == 0 || slot.id != id {
        error!(name = %name, id = %id, "released a connection that is not held");
        return Err(CatalogError::ConnectionNotHeld {
            name: name.to_string(),
        });
    }

    slot.connection_count -= 1;
    debug!(
        name = %name,
        id = %id,
        connections = slot.connection_count,
        "released multiplexed client connection"
    );

    let closed = protocol.close().await;

    if slot.connection_count == 0 {
        if let Some(process) = slot.process.take() {
            process.kill().await;
        }
        slot.protocol = None;
        slot.conn = None;
        debug!(name = %name, id = %id, "killed plugin process");
    }

    closed
}

impl Drop for MultiplexedClient {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        warn!(name = %self.name, id = %self.id, "multiplexed client dropped without close");

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            error!(name = %self.name, id = %self.id, "no runtime to release dropped client");
            return;
        };
        let slot = Arc::clone(&self.slot);
        let name = self.name.clone();
        let id = self.id.clone();
        let protocol = Arc::clone(&self.protocol);
        handle.spawn(async move {
            if let Err(err) = release(&slot, &name, &id, &protocol).await {
                debug!(name = %name, error = %err, "release of dropped client failed");
            }
        });
    }
}

impl std::fmt::Debug for MultiplexedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiplexedClient")
            .field("name", &self.name)
            .field("id", &self.id)
            .field("conn", &self.conn.is_some())
            .finish_non_exhaustive()
    }
}
