//! Background worker monitor.
//!
//! # Responsibilities
//! - Own the worker's child handle after the first spawn
//! - Record every exit and apply the restart policy
//! - Stop the worker when shutdown is broadcast
//!
//! # Design Decisions
//! - The first spawn happens on the supervisor's task, so the worker is
//!   always launched before the server
//! - The worker never waits on the server and the server never waits on it
//! - Giving up either degrades the container or shuts it down, per config

use std::time::Duration;

use tokio::process::Child;
use tokio::sync::broadcast;

use crate::config::{GiveUpAction, WorkerConfig};
use crate::lifecycle::{wait_for_escalation, wait_for_shutdown, Shutdown, ShutdownReason};
use crate::process::{self, ExitReport, LaunchError, ProcessSpec, Role};
use crate::resilience::backoff::restart_delay;
use crate::resilience::restart::{should_restart, Termination};
use crate::supervisor::events::Reporter;

/// Summary of the worker's life, returned when its monitor finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WorkerReport {
    /// Restarts scheduled.
    pub restarts: u32,
    /// The restart policy gave up on the worker.
    pub gave_up: bool,
}

/// Supervises the background worker.
pub struct WorkerMonitor {
    spec: ProcessSpec,
    config: WorkerConfig,
    grace: Duration,
    reporter: Reporter,
    shutdown: Shutdown,
}

impl WorkerMonitor {
    pub fn new(
        config: WorkerConfig,
        grace: Duration,
        reporter: Reporter,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            spec: ProcessSpec::worker(&config),
            config,
            grace,
            reporter,
            shutdown,
        }
    }

    /// Launch the worker once. Outcome is reported either way.
    pub fn launch(&self, attempt: u32) -> Result<Child, LaunchError> {
        let launched = process::spawn_background(&self.spec);
        match &launched {
            Ok(child) => self.reporter.spawned(Role::Worker, child.id(), attempt),
            Err(e) => self.reporter.spawn_failed(Role::Worker, e),
        }
        launched
    }

    /// Supervise the worker until it is given up on or shutdown is
    /// broadcast on `stop`.
    pub async fn run(
        self,
        first: Result<Child, LaunchError>,
        mut stop: broadcast::Receiver<ShutdownReason>,
    ) -> WorkerReport {
        let mut restarts = 0u32;
        let mut current = first;

        loop {
            let termination = match current {
                Ok(mut child) => {
                    tokio::select! {
                        status = child.wait() => match status {
                            Ok(status) => {
                                let report = ExitReport::from(status);
                                self.reporter.exited(Role::Worker, report);
                                Termination::Exited(report)
                            }
                            Err(e) => {
                                tracing::error!(error = %e, "Lost track of worker process");
                                Termination::Lost
                            }
                        },
                        _ = wait_for_shutdown(&mut stop) => {
                            self.stop(&mut child, &mut stop).await;
                            return WorkerReport { restarts, gave_up: false };
                        }
                    }
                }
                Err(_) => Termination::SpawnFailed,
            };

            if !should_restart(self.config.restart, &termination, restarts, self.config.max_restarts) {
                self.reporter.gave_up(Role::Worker, restarts);
                if self.config.on_give_up == GiveUpAction::Shutdown {
                    self.shutdown.trigger(ShutdownReason::WorkerGaveUp);
                }
                return WorkerReport { restarts, gave_up: true };
            }

            restarts += 1;
            let delay = restart_delay(restarts, self.config.backoff_base_ms, self.config.backoff_max_ms);
            self.reporter.restarting(Role::Worker, restarts, delay);

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = wait_for_shutdown(&mut stop) => {
                    return WorkerReport { restarts, gave_up: false };
                }
            }

            current = self.launch(restarts + 1);
        }
    }

    async fn stop(&self, child: &mut Child, stop: &mut broadcast::Receiver<ShutdownReason>) {
        match process::terminate(child, Role::Worker, self.grace, wait_for_escalation(stop)).await {
            Ok(status) => self.reporter.exited(Role::Worker, ExitReport::from(status)),
            Err(e) => tracing::error!(error = %e, "Failed to stop worker process"),
        }
    }
}
