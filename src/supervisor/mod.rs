//! Two-process supervisor.
//!
//! # Data Flow
//! ```text
//! Supervisor::run
//!     → worker.rs: spawn worker (background), hand child to WorkerMonitor task
//!     → spawn server (foreground), start readiness probe
//!     → wait: server exit | shutdown reason
//!         shutdown → SIGTERM server → grace → SIGKILL
//!     → stop (or release) the worker
//!     → ExitOutcome (server exit status becomes the entrypoint's)
//! ```
//!
//! # Design Decisions
//! - Strict start order: worker, then server; no readiness coupling
//! - The entrypoint waits on the server rather than exec'ing it, so the
//!   worker stays supervised and the server's exit code is still propagated
//! - Server spawn failure is fatal; worker spawn failure is not

pub mod events;
pub mod worker;

use std::sync::Arc;
use std::time::Duration;

use nix::sys::signal::Signal;
use thiserror::Error;
use tokio::process::Child;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::config::EntrypointConfig;
use crate::health::{ReadinessProbe, StatusRegistry};
use crate::lifecycle::{wait_for_escalation, wait_for_shutdown, Shutdown, ShutdownReason};
use crate::process::{self, ExitReport, LaunchError, ProcessSpec, Role};

pub use events::{Reporter, SupervisorEvent, EVENT_CAPACITY};
pub use worker::{WorkerMonitor, WorkerReport};

/// Supervision failed before the server produced an exit status.
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error(transparent)]
    ServerLaunch(#[from] LaunchError),

    #[error("failed to wait for server process: {0}")]
    Wait(#[source] std::io::Error),

    #[error("shutdown requested before start ({0:?})")]
    Interrupted(ShutdownReason),
}

impl SupervisorError {
    /// Exit code for the entrypoint.
    pub fn exit_code(&self) -> u8 {
        match self {
            SupervisorError::ServerLaunch(e) => e.exit_code(),
            SupervisorError::Wait(_) => 1,
            SupervisorError::Interrupted(ShutdownReason::Signal(name)) => name
                .parse::<Signal>()
                .map(|signal| 128u8.saturating_add(signal as u8))
                .unwrap_or(1),
            SupervisorError::Interrupted(_) => 1,
        }
    }
}

/// How the entrypoint run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitOutcome {
    /// The server's exit status.
    pub server: ExitReport,
    /// Why the server was stopped, when it did not exit on its own.
    pub cause: Option<ShutdownReason>,
    /// What became of the worker.
    pub worker: WorkerReport,
}

impl ExitOutcome {
    /// Exit code for the entrypoint: the server's own code (`128 + signal`
    /// for signal deaths). A worker-triggered shutdown is never reported as
    /// success.
    pub fn exit_code(&self) -> u8 {
        let code = self.server.exit_code();
        let code = if code == 0 && self.cause == Some(ShutdownReason::WorkerGaveUp) {
            1
        } else {
            code
        };
        (code & 0xff) as u8
    }
}

/// Starts the worker and the server, and supervises both.
pub struct Supervisor {
    config: EntrypointConfig,
    registry: Arc<StatusRegistry>,
    events: broadcast::Sender<SupervisorEvent>,
    shutdown: Shutdown,
}

impl Supervisor {
    pub fn new(config: EntrypointConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            config,
            registry: Arc::new(StatusRegistry::new()),
            events,
            shutdown: Shutdown::new(),
        }
    }

    /// Shared status, for the status endpoint.
    pub fn registry(&self) -> Arc<StatusRegistry> {
        self.registry.clone()
    }

    /// Subscribe to supervisor events. Subscribe before [`Supervisor::run`]
    /// to observe the launches.
    pub fn subscribe(&self) -> broadcast::Receiver<SupervisorEvent> {
        self.events.subscribe()
    }

    /// Handle used to request shutdown (signals, tests).
    pub fn shutdown_handle(&self) -> Shutdown {
        self.shutdown.clone()
    }

    fn grace(&self) -> Duration {
        Duration::from_secs(self.config.supervisor.shutdown_grace_secs)
    }

    /// Run until the server exits or shutdown completes. Nothing is spawned
    /// when shutdown was requested before the call.
    pub async fn run(self) -> Result<ExitOutcome, SupervisorError> {
        let reporter = Reporter::new(self.registry.clone(), self.events.clone());
        let mut shutdown_rx = self.shutdown.subscribe();
        let worker_stop = self.shutdown.subscribe();

        if let Some(reason) = self.shutdown.requested() {
            reporter.shutdown_requested(reason);
            return Err(SupervisorError::Interrupted(reason));
        }

        tracing::info!(
            run_id = %self.registry.run_id(),
            worker = %ProcessSpec::worker(&self.config.worker).command_line(),
            server = %ProcessSpec::server(&self.config.server).command_line(),
            "Starting supervised processes"
        );

        let worker_task = self.start_worker(&reporter, worker_stop);

        let server_spec = ProcessSpec::server(&self.config.server);
        let result = match process::spawn_foreground(&server_spec) {
            Ok(child) => {
                reporter.spawned(Role::Server, child.id(), 1);
                self.supervise_server(child, &reporter, &mut shutdown_rx).await
            }
            Err(e) => {
                reporter.spawn_failed(Role::Server, &e);
                Err(SupervisorError::ServerLaunch(e))
            }
        };

        let signalled = matches!(&result, Ok((_, Some(_))));
        let worker = self.finish_worker(worker_task, signalled, &reporter).await;

        let (server, cause) = result?;
        let outcome = ExitOutcome { server, cause, worker };
        tracing::info!(
            exit_code = outcome.exit_code(),
            cause = ?outcome.cause,
            worker_restarts = worker.restarts,
            "Supervisor finished"
        );
        Ok(outcome)
    }

    fn start_worker(
        &self,
        reporter: &Reporter,
        stop: broadcast::Receiver<ShutdownReason>,
    ) -> JoinHandle<WorkerReport> {
        let monitor = WorkerMonitor::new(
            self.config.worker.clone(),
            self.grace(),
            reporter.clone(),
            self.shutdown.clone(),
        );
        let first = monitor.launch(1);
        tokio::spawn(monitor.run(first, stop))
    }

    async fn supervise_server(
        &self,
        mut server: Child,
        reporter: &Reporter,
        shutdown_rx: &mut broadcast::Receiver<ShutdownReason>,
    ) -> Result<(ExitReport, Option<ShutdownReason>), SupervisorError> {
        let probe_task = self.start_probe(reporter);

        let mut cause = None;
        let status = tokio::select! {
            status = server.wait() => status,
            reason = wait_for_shutdown(shutdown_rx) => {
                cause = Some(reason);
                reporter.shutdown_requested(reason);
                process::terminate(&mut server, Role::Server, self.grace(), wait_for_escalation(shutdown_rx)).await
            }
        };

        if let Some(task) = probe_task {
            task.abort();
        }

        let report = ExitReport::from(status.map_err(SupervisorError::Wait)?);
        reporter.exited(Role::Server, report);
        Ok((report, cause))
    }

    fn start_probe(&self, reporter: &Reporter) -> Option<JoinHandle<()>> {
        if !self.config.server.readiness_probe {
            return None;
        }

        let probe = match ReadinessProbe::from_config(&self.config.server) {
            Ok(probe) => probe,
            Err(e) => {
                tracing::warn!(error = %e, "Cannot build readiness probe URL, skipping probe");
                return None;
            }
        };
        let reporter = reporter.clone();
        Some(tokio::spawn(async move {
            if probe.wait_ready().await {
                reporter.ready(Role::Server);
            }
        }))
    }

    /// Stop the worker, or release it when configured to outlive the server.
    /// A worker already being stopped by a shutdown is always waited for.
    async fn finish_worker(
        &self,
        task: JoinHandle<WorkerReport>,
        signalled: bool,
        reporter: &Reporter,
    ) -> WorkerReport {
        if signalled || task.is_finished() || self.config.supervisor.stop_worker_on_exit {
            self.shutdown.trigger(ShutdownReason::ServerExited);
            return match task.await {
                Ok(report) => report,
                Err(e) => {
                    tracing::error!(error = %e, "Worker monitor task failed");
                    WorkerReport::default()
                }
            };
        }

        // Dropping the monitor drops the child handle without killing it.
        task.abort();
        let _ = task.await;
        reporter.detached(Role::Worker, self.registry.get(Role::Worker).pid);
        WorkerReport::default()
    }
}
