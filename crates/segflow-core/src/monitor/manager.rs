//! Orchestrates the per-kind monitors as one unit

use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use super::base::{JobMonitor, MonitorStatus};
use super::evaluation::EvaluationMonitor;
use super::inference::InferenceMonitor;
use super::training::TrainingMonitor;
use crate::repository::Database;
use crate::slurm::{JobInfo, SchedulerClient};
use crate::Result;

/// Combined status of the manager and its monitors
#[derive(Debug, Clone, Serialize)]
pub struct ManagerStatus {
    pub manager_running: bool,
    pub monitors: Vec<MonitorStatus>,
}

/// Owns one monitor per job kind, all sharing the same pool and scheduler
/// client.
pub struct MonitorManager {
    monitors: Vec<Arc<JobMonitor>>,
    running: AtomicBool,
}

impl MonitorManager {
    pub fn new(db: Database, scheduler: Arc<dyn SchedulerClient>, poll_interval: Duration) -> Self {
        let monitors = vec![
            Arc::new(JobMonitor::new(
                Arc::new(TrainingMonitor::new(db.clone())),
                db.clone(),
                scheduler.clone(),
                poll_interval,
            )),
            Arc::new(JobMonitor::new(
                Arc::new(InferenceMonitor::new(db.clone())),
                db.clone(),
                scheduler.clone(),
                poll_interval,
            )),
            Arc::new(JobMonitor::new(
                Arc::new(EvaluationMonitor::new(db.clone())),
                db,
                scheduler,
                poll_interval,
            )),
        ];

        Self {
            monitors,
            running: AtomicBool::new(false),
        }
    }

    /// Start all monitors concurrently; if any fails to start, the ones that
    /// did come up are stopped again.
    pub async fn start(&self) -> Result<()> {
        if self.running.load(Ordering::SeqCst) {
            warn!("MonitorManager is already running");
            return Ok(());
        }

        info!("Starting MonitorManager...");

        let results =
            futures::future::join_all(self.monitors.iter().map(|m| m.clone().start())).await;

        if let Some(first_error) = results.into_iter().find_map(|r| r.err()) {
            error!("Failed to start MonitorManager: {}", first_error);
            self.stop_monitors().await;
            return Err(first_error);
        }

        self.running.store(true, Ordering::SeqCst);
        info!("MonitorManager started successfully - all monitors running");
        Ok(())
    }

    /// Stop all monitors, swallowing individual errors but waiting for each.
    pub async fn stop(&self) {
        if !self.running.load(Ordering::SeqCst) {
            warn!("MonitorManager is not running");
            return;
        }

        info!("Stopping MonitorManager...");
        self.stop_monitors().await;
        self.running.store(false, Ordering::SeqCst);
        info!("MonitorManager stopped successfully");
    }

    async fn stop_monitors(&self) {
        for monitor in &self.monitors {
            if monitor.is_running() {
                monitor.stop().await;
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst) && self.monitors.iter().any(|m| m.is_running())
    }

    /// Poll a specific job once, routed to the monitor that owns its kind.
    /// Never mutates.
    pub async fn poll_once(&self, job_id: &str) -> Result<Option<JobInfo>> {
        for monitor in &self.monitors {
            if let Some(info) = monitor.poll_job_once(job_id).await? {
                return Ok(Some(info));
            }
        }
        Ok(None)
    }

    pub async fn status(&self) -> ManagerStatus {
        let mut monitors = Vec::with_capacity(self.monitors.len());
        for monitor in &self.monitors {
            monitors.push(monitor.status().await);
        }

        ManagerStatus {
            manager_running: self.is_running(),
            monitors,
        }
    }
}
