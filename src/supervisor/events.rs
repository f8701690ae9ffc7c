//! Supervisor events and the reporter that fans them out.
//!
//! Every observable thing that happens to a child goes through [`Reporter`],
//! which logs it, updates the status registry and metrics, and broadcasts a
//! [`SupervisorEvent`] to subscribers.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::broadcast;

use crate::health::StatusRegistry;
use crate::lifecycle::ShutdownReason;
use crate::observability::metrics;
use crate::process::{ExitReport, LaunchError, Role};

/// Capacity of the event channel. Slow subscribers lag, they never block
/// the supervisor.
pub const EVENT_CAPACITY: usize = 64;

/// Something observable that happened to a supervised process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SupervisorEvent {
    Spawned { role: Role, pid: Option<u32>, attempt: u32 },
    SpawnFailed { role: Role, error: String },
    Exited { role: Role, report: ExitReport },
    Restarting { role: Role, restart: u32, delay_ms: u64 },
    GaveUp { role: Role },
    Ready { role: Role },
    Detached { role: Role, pid: Option<u32> },
    ShutdownRequested { reason: ShutdownReason },
}

/// Fans supervisor observations out to logs, status, metrics and events.
#[derive(Debug, Clone)]
pub struct Reporter {
    registry: Arc<StatusRegistry>,
    events: broadcast::Sender<SupervisorEvent>,
}

impl Reporter {
    pub fn new(registry: Arc<StatusRegistry>, events: broadcast::Sender<SupervisorEvent>) -> Self {
        Self { registry, events }
    }

    fn emit(&self, event: SupervisorEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    pub fn spawned(&self, role: Role, pid: Option<u32>, attempt: u32) {
        tracing::info!(role = %role, pid = ?pid, attempt, "Process started");
        self.registry.record_spawn(role, pid);
        metrics::record_spawn(role);
        self.emit(SupervisorEvent::Spawned { role, pid, attempt });
    }

    pub fn spawn_failed(&self, role: Role, error: &LaunchError) {
        tracing::error!(role = %role, program = %error.program, error = %error.source, "Process failed to start");
        self.registry.record_spawn_failure(role, &error.to_string());
        metrics::record_spawn_failure(role);
        self.emit(SupervisorEvent::SpawnFailed {
            role,
            error: error.to_string(),
        });
    }

    pub fn exited(&self, role: Role, report: ExitReport) {
        if report.success() {
            tracing::info!(role = %role, code = ?report.code, "Process exited");
        } else {
            tracing::warn!(role = %role, code = ?report.code, signal = ?report.signal, "Process exited with failure");
        }
        self.registry.record_exit(role, report);
        metrics::record_exit(role, &report);
        self.emit(SupervisorEvent::Exited { role, report });
    }

    pub fn restarting(&self, role: Role, restart: u32, delay: Duration) {
        tracing::info!(role = %role, restart, delay = ?delay, "Restarting process after backoff");
        self.registry.record_restarting(role);
        metrics::record_restart();
        self.emit(SupervisorEvent::Restarting {
            role,
            restart,
            delay_ms: delay.as_millis() as u64,
        });
    }

    pub fn gave_up(&self, role: Role, restarts: u32) {
        tracing::error!(role = %role, restarts, "Restart policy exhausted, process will not be started again");
        self.registry.record_gave_up(role, "restart policy exhausted");
        self.emit(SupervisorEvent::GaveUp { role });
    }

    pub fn ready(&self, role: Role) {
        if self.registry.record_ready(role) {
            tracing::info!(role = %role, "Process is ready");
            self.emit(SupervisorEvent::Ready { role });
        }
    }

    pub fn detached(&self, role: Role, pid: Option<u32>) {
        tracing::warn!(role = %role, pid = ?pid, "Leaving process running after entrypoint exit");
        self.registry.record_detached(role);
        self.emit(SupervisorEvent::Detached { role, pid });
    }

    pub fn shutdown_requested(&self, reason: ShutdownReason) {
        tracing::info!(?reason, "Stopping supervised processes");
        self.emit(SupervisorEvent::ShutdownRequested { reason });
    }
}
