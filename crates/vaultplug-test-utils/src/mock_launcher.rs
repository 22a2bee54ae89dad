// SPDX-FileCopyrightText: 2026 Vaultplug Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock plugin launcher for deterministic testing.
//!
//! `MockLauncher` implements `PluginLauncher` without spawning anything. Each
//! "binary" is declared by its file name together with the protocol it
//! speaks, and every process it starts reports into a shared [`LaunchStats`].

use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use vaultplug_core::{
    BackendClient, BackendConfig, BackendType, BuiltinFactory, CatalogError, ClientProtocol,
    LaunchOptions, PluginLauncher, PluginProcess, PluginRunner, ProtocolVersion, RawConnection,
};

/// What a mock plugin binary answers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockPluginKind {
    /// Speaks the current database protocol.
    DatabaseV5,
    /// Speaks only the deprecated database protocol.
    DatabaseV4,
    /// Generic backend declaring the given kind during setup.
    Backend(BackendType),
    /// Generic backend whose setup call fails.
    BackendSetupFails,
    /// Fails every handshake.
    Broken,
}

impl MockPluginKind {
    fn speaks(self, protocol: ProtocolVersion) -> bool {
        matches!(
            (self, protocol),
            (MockPluginKind::DatabaseV5, ProtocolVersion::DatabaseV5)
                | (MockPluginKind::DatabaseV4, ProtocolVersion::DatabaseV4)
        )
    }
}

/// Counters shared by a launcher and everything it starts.
#[derive(Debug, Default)]
pub struct LaunchStats {
    launches: AtomicUsize,
    kills: AtomicUsize,
    live: AtomicUsize,
    max_live: AtomicUsize,
    closes: AtomicUsize,
    cleanups: AtomicUsize,
    protocols: Mutex<Vec<ProtocolVersion>>,
}

impl LaunchStats {
    /// Processes started, backend clients included.
    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    /// Processes killed through [`PluginProcess::kill`].
    pub fn kills(&self) -> usize {
        self.kills.load(Ordering::SeqCst)
    }

    /// Processes currently alive.
    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Highest number of processes alive at the same time.
    pub fn max_live(&self) -> usize {
        self.max_live.load(Ordering::SeqCst)
    }

    /// RPC sessions closed.
    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// Backend clients cleaned up.
    pub fn cleanups(&self) -> usize {
        self.cleanups.load(Ordering::SeqCst)
    }

    /// Protocols of every successful launch, in order.
    pub fn protocols(&self) -> Vec<ProtocolVersion> {
        self.protocols
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn started(&self, protocol: ProtocolVersion) {
        self.launches.fetch_add(1, Ordering::SeqCst);
        let live = self.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_live.fetch_max(live, Ordering::SeqCst);
        self.protocols
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(protocol);
    }

    fn stopped(&self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A launcher whose plugins are declared up front by command file name.
#[derive(Default)]
pub struct MockLauncher {
    kinds: Mutex<HashMap<String, MockPluginKind>>,
    stats: Arc<LaunchStats>,
    launch_delay: Mutex<Option<Duration>>,
    client_delay: Mutex<Option<Duration>>,
    fail_client: Arc<AtomicBool>,
}

impl MockLauncher {
    /// Create a launcher that knows no binaries.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the behavior of the binary named `file_name`.
    #[must_use]
    pub fn with_plugin(self, file_name: &str, kind: MockPluginKind) -> Self {
        self.register(file_name, kind);
        self
    }

    /// Declare or replace the behavior of the binary named `file_name`.
    pub fn register(&self, file_name: &str, kind: MockPluginKind) {
        self.kinds
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(file_name.to_string(), kind);
    }

    /// Delay every launch by `delay` before the handshake completes.
    pub fn set_launch_delay(&self, delay: Option<Duration>) {
        *self
            .launch_delay
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = delay;
    }

    /// Delay [`PluginProcess::client`] on processes started from now on.
    pub fn set_client_delay(&self, delay: Option<Duration>) {
        *self
            .client_delay
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = delay;
    }

    /// Make [`PluginProcess::client`] fail on processes started from now on.
    pub fn set_fail_client(&self, fail: bool) {
        self.fail_client.store(fail, Ordering::SeqCst);
    }

    /// Shared counters.
    pub fn stats(&self) -> Arc<LaunchStats> {
        Arc::clone(&self.stats)
    }

    async fn resolve(&self, runner: &PluginRunner) -> Result<MockPluginKind, CatalogError> {
        let delay = *self
            .launch_delay
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let file_name = runner
            .command
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default();
        self.kinds
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(file_name)
            .copied()
            .ok_or_else(|| {
                CatalogError::launch(
                    &runner.name,
                    format!("no such file: {}", runner.command.display()),
                )
            })
    }
}

#[async_trait]
impl PluginLauncher for MockLauncher {
    async fn launch(
        &self,
        runner: &PluginRunner,
        options: &LaunchOptions,
    ) -> Result<Arc<dyn PluginProcess>, CatalogError> {
        let kind = self.resolve(runner).await?;
        if !kind.speaks(options.protocol) {
            return Err(CatalogError::launch(
                &runner.name,
                format!("handshake failed: plugin does not speak {}", options.protocol),
            ));
        }

        self.stats.started(options.protocol);
        tracing::debug!(name = %runner.name, protocol = %options.protocol, "mock plugin started");
        Ok(Arc::new(MockProcess {
            name: runner.name.clone(),
            stats: Arc::clone(&self.stats),
            fail_client: self.fail_client.load(Ordering::SeqCst),
            client_delay: *self
                .client_delay
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
            client: Mutex::new(None),
            killed: AtomicBool::new(false),
        }))
    }

    async fn backend_client(
        &self,
        runner: &PluginRunner,
        options: &LaunchOptions,
    ) -> Result<Box<dyn BackendClient>, CatalogError> {
        let (backend_type, fail_setup) = match self.resolve(runner).await? {
            MockPluginKind::Backend(backend_type) => (backend_type, false),
            MockPluginKind::BackendSetupFails => (BackendType::Unknown, true),
            _ => {
                return Err(CatalogError::launch(
                    &runner.name,
                    "handshake failed: plugin is not a backend",
                ));
            }
        };

        self.stats.started(options.protocol);
        Ok(Box::new(MockBackend {
            backend_type,
            fail_setup,
            configured: false,
            cleaned_up: false,
            stats: Arc::clone(&self.stats),
        }))
    }
}

/// A pretend plugin process.
pub struct MockProcess {
    name: String,
    stats: Arc<LaunchStats>,
    fail_client: bool,
    client_delay: Option<Duration>,
    client: Mutex<Option<Arc<dyn ClientProtocol>>>,
    killed: AtomicBool,
}

#[async_trait]
impl PluginProcess for MockProcess {
    async fn client(&self) -> Result<Arc<dyn ClientProtocol>, CatalogError> {
        if let Some(delay) = self.client_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_client {
            return Err(CatalogError::rpc(format!(
                "could not connect to plugin {}",
                self.name
            )));
        }
        let mut client = self.client.lock().unwrap_or_else(PoisonError::into_inner);
        let protocol = client.get_or_insert_with(|| -> Arc<dyn ClientProtocol> {
            Arc::new(MockProtocol {
                name: self.name.clone(),
                conn: Arc::new(format!("conn-{}", self.name)),
                stats: Arc::clone(&self.stats),
            })
        });
        Ok(Arc::clone(protocol))
    }

    async fn kill(&self) {
        if !self.killed.swap(true, Ordering::SeqCst) {
            self.stats.kills.fetch_add(1, Ordering::SeqCst);
            self.stats.stopped();
        }
    }
}

/// RPC session of a [`MockProcess`].
pub struct MockProtocol {
    name: String,
    conn: RawConnection,
    stats: Arc<LaunchStats>,
}

#[async_trait]
impl ClientProtocol for MockProtocol {
    async fn dispense(&self, service: &str) -> Result<Box<dyn Any + Send + Sync>, CatalogError> {
        Ok(Box::new(format!("{}:{service}", self.name)))
    }

    async fn ping(&self) -> Result<(), CatalogError> {
        Ok(())
    }

    async fn close(&self) -> Result<(), CatalogError> {
        self.stats.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn raw_connection(&self) -> Option<RawConnection> {
        Some(Arc::clone(&self.conn))
    }
}

/// Backend client handed out for [`MockPluginKind::Backend`] binaries.
pub struct MockBackend {
    backend_type: BackendType,
    fail_setup: bool,
    configured: bool,
    cleaned_up: bool,
    stats: Arc<LaunchStats>,
}

#[async_trait]
impl BackendClient for MockBackend {
    async fn setup(&mut self, _config: &BackendConfig) -> Result<(), CatalogError> {
        if self.fail_setup {
            return Err(CatalogError::rpc("backend setup failed"));
        }
        self.configured = true;
        Ok(())
    }

    fn backend_type(&self) -> BackendType {
        if self.configured {
            self.backend_type
        } else {
            BackendType::Unknown
        }
    }

    async fn cleanup(&mut self) {
        if !self.cleaned_up {
            self.cleaned_up = true;
            self.stats.cleanups.fetch_add(1, Ordering::SeqCst);
            self.stats.stopped();
        }
    }
}

/// Builtin factory producing the plugin's name as its instance.
#[derive(Debug, Clone)]
pub struct MockBuiltinFactory {
    name: String,
}

impl MockBuiltinFactory {
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self { name: name.into() })
    }
}

impl BuiltinFactory for MockBuiltinFactory {
    fn create(&self) -> Result<Box<dyn Any + Send + Sync>, CatalogError> {
        Ok(Box::new(self.name.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vaultplug_core::PluginType;

    fn runner(command: &str) -> PluginRunner {
        PluginRunner::external("p", PluginType::Unknown, format!("/plugins/{command}"))
    }

    #[tokio::test]
    async fn launch_counts_and_kill_is_idempotent() {
        let launcher = MockLauncher::new().with_plugin("db", MockPluginKind::DatabaseV5);
        let opts = LaunchOptions::new(ProtocolVersion::DatabaseV5, "test");

        let process = launcher.launch(&runner("db"), &opts).await.unwrap();
        let stats = launcher.stats();
        assert_eq!(stats.launches(), 1);
        assert_eq!(stats.live(), 1);

        process.kill().await;
        process.kill().await;
        assert_eq!(stats.kills(), 1);
        assert_eq!(stats.live(), 0);
    }

    #[tokio::test]
    async fn wrong_protocol_fails_handshake() {
        let launcher = MockLauncher::new().with_plugin("old", MockPluginKind::DatabaseV4);
        let opts = LaunchOptions::new(ProtocolVersion::DatabaseV5, "test");
        assert!(launcher.launch(&runner("old"), &opts).await.is_err());
        assert_eq!(launcher.stats().launches(), 0);
    }

    #[tokio::test]
    async fn client_is_established_once() {
        let launcher = MockLauncher::new().with_plugin("db", MockPluginKind::DatabaseV5);
        let opts = LaunchOptions::new(ProtocolVersion::DatabaseV5, "test");
        let process = launcher.launch(&runner("db"), &opts).await.unwrap();

        let first = process.client().await.unwrap();
        let second = process.client().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(first.raw_connection().is_some());
    }

    #[tokio::test]
    async fn backend_reports_type_after_setup() {
        let launcher = MockLauncher::new()
            .with_plugin("kv", MockPluginKind::Backend(BackendType::Logical));
        let opts = LaunchOptions::new(ProtocolVersion::Backend, "test");
        let mut client = launcher.backend_client(&runner("kv"), &opts).await.unwrap();

        assert_eq!(client.backend_type(), BackendType::Unknown);
        client.setup(&BackendConfig::default()).await.unwrap();
        assert_eq!(client.backend_type(), BackendType::Logical);

        client.cleanup().await;
        assert_eq!(launcher.stats().live(), 0);
        assert_eq!(launcher.stats().cleanups(), 1);
    }
}
