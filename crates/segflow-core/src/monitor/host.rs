//! Engine host: supervises the monitor manager away from request handling

use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::manager::{ManagerStatus, MonitorManager};
use crate::repository::Database;
use crate::Result;

/// How often the supervisor checks that the manager is still alive
const SUPERVISOR_INTERVAL: Duration = Duration::from_secs(1);

/// Health snapshot reported by `/health/poller`
#[derive(Debug, Clone, Serialize)]
pub struct HostHealth {
    pub healthy: bool,
    pub manager_running: bool,
    pub database_healthy: bool,
}

/// Runs the `MonitorManager` in its own supervised task group.
///
/// Startup is idempotent; shutdown is wired into the server's exit path. If
/// the manager stops on its own the host logs a status snapshot and leaves it
/// down for the operator.
pub struct EngineHost {
    manager: Arc<MonitorManager>,
    db: Database,
    started: AtomicBool,
    supervisor: Mutex<Option<JoinHandle<()>>>,
    shutdown_tx: watch::Sender<bool>,
}

impl EngineHost {
    pub fn new(manager: Arc<MonitorManager>, db: Database) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            manager,
            db,
            started: AtomicBool::new(false),
            supervisor: Mutex::new(None),
            shutdown_tx,
        }
    }

    pub fn manager(&self) -> &Arc<MonitorManager> {
        &self.manager
    }

    /// Start the manager and its supervisor. A second call logs and returns.
    pub async fn start(self: Arc<Self>) -> Result<()> {
        if self.started.swap(true, Ordering::SeqCst) {
            warn!("Engine host is already running");
            return Ok(());
        }

        info!("Starting reconciliation engine host");

        if let Err(e) = self.manager.start().await {
            self.started.store(false, Ordering::SeqCst);
            return Err(e);
        }

        let _ = self.shutdown_tx.send(false);
        let host = self.clone();
        let handle = tokio::spawn(async move {
            host.supervise().await;
        });
        *self.supervisor.lock().await = Some(handle);

        info!("Reconciliation engine host started");
        Ok(())
    }

    /// Watch the manager; an unexpected stop is surfaced, not restarted.
    async fn supervise(self: Arc<Self>) {
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                _ = tokio::time::sleep(SUPERVISOR_INTERVAL) => {
                    if !self.manager.is_running() {
                        let status = self.manager.status().await;
                        error!(
                            "Monitor manager stopped unexpectedly - status: {}",
                            serde_json::to_string(&status)
                                .unwrap_or_else(|_| "unserializable".to_string())
                        );
                        break;
                    }
                }
                _ = shutdown_rx.changed() => {
                    info!("Shutdown signal received, stopping monitor manager");
                    break;
                }
            }
        }
    }

    /// Stop the engine gracefully. Safe to call more than once.
    pub async fn shutdown(&self) {
        if !self.started.swap(false, Ordering::SeqCst) {
            return;
        }

        info!("Shutting down reconciliation engine host");

        let _ = self.shutdown_tx.send(true);

        if let Some(handle) = self.supervisor.lock().await.take() {
            let _ = handle.await;
        }

        self.manager.stop().await;

        info!("Reconciliation engine host shutdown complete");
    }

    pub fn is_running(&self) -> bool {
        self.started.load(Ordering::SeqCst) && self.manager.is_running()
    }

    /// Healthy iff the manager runs and the database answers.
    pub async fn health(&self) -> HostHealth {
        let manager_running = self.manager.is_running();
        let database_healthy = self.db.ping().await.is_ok();

        HostHealth {
            healthy: manager_running && database_healthy,
            manager_running,
            database_healthy,
        }
    }

    pub async fn status(&self) -> ManagerStatus {
        self.manager.status().await
    }
}
