//! Supervised process state.
//!
//! # States
//! - Pending: not started yet
//! - Running: spawned and alive
//! - Ready: server answered its readiness probe
//! - Restarting: exited, waiting out the backoff before the next spawn
//! - Exited: ended cleanly and will not be restarted
//! - Failed: ended with an error (or never started) and will not be restarted
//! - Detached: released at shutdown and left running
//!
//! # State Transitions
//! ```text
//! Pending → Running → Ready
//! Running/Ready → Restarting → Running
//! Running/Ready/Restarting → Exited | Failed | Detached
//! Pending → Failed (spawn failure)
//! ```
//!
//! # Design Decisions
//! - Phase changes are logged by the supervisor, not here
//! - The registry is the single source for the status endpoint

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use dashmap::DashMap;
use serde::Serialize;
use uuid::Uuid;

use crate::process::{ExitReport, Role};

/// Supervisor-observed phase of a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Pending,
    Running,
    Ready,
    Restarting,
    Exited,
    Failed,
    Detached,
}

impl Phase {
    /// The process is alive and supervised.
    pub fn is_up(&self) -> bool {
        matches!(self, Phase::Running | Phase::Ready)
    }
}

/// Snapshot of one process.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessStatus {
    pub role: Role,
    pub phase: Phase,
    pub pid: Option<u32>,
    /// Successful spawns so far.
    pub starts: u32,
    /// Restarts scheduled so far.
    pub restarts: u32,
    pub last_exit: Option<ExitReport>,
    pub last_error: Option<String>,
    /// Milliseconds since the Unix epoch of the last phase change.
    pub changed_at_ms: u64,
}

impl ProcessStatus {
    fn new(role: Role) -> Self {
        Self {
            role,
            phase: Phase::Pending,
            pid: None,
            starts: 0,
            restarts: 0,
            last_exit: None,
            last_error: None,
            changed_at_ms: now_ms(),
        }
    }

    fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
        self.changed_at_ms = now_ms();
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// Shared status of both supervised processes.
#[derive(Debug)]
pub struct StatusRegistry {
    run_id: Uuid,
    started_at: SystemTime,
    processes: DashMap<Role, ProcessStatus>,
}

impl StatusRegistry {
    pub fn new() -> Self {
        let processes = DashMap::new();
        for role in [Role::Worker, Role::Server] {
            processes.insert(role, ProcessStatus::new(role));
        }
        Self {
            run_id: Uuid::new_v4(),
            started_at: SystemTime::now(),
            processes,
        }
    }

    /// Identifier of this entrypoint run.
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed().unwrap_or_default()
    }

    pub fn get(&self, role: Role) -> ProcessStatus {
        self.processes
            .get(&role)
            .map(|entry| entry.value().clone())
            .unwrap_or_else(|| ProcessStatus::new(role))
    }

    pub fn phase(&self, role: Role) -> Phase {
        self.get(role).phase
    }

    /// Worker first, then server.
    pub fn snapshot(&self) -> Vec<ProcessStatus> {
        vec![self.get(Role::Worker), self.get(Role::Server)]
    }

    /// Both processes are up.
    pub fn is_healthy(&self) -> bool {
        self.phase(Role::Worker).is_up() && self.phase(Role::Server).is_up()
    }

    fn update<F>(&self, role: Role, f: F)
    where
        F: FnOnce(&mut ProcessStatus),
    {
        let mut entry = self.processes.entry(role).or_insert_with(|| ProcessStatus::new(role));
        f(entry.value_mut());
    }

    pub fn record_spawn(&self, role: Role, pid: Option<u32>) {
        self.update(role, |s| {
            s.pid = pid;
            s.starts += 1;
            s.last_error = None;
            s.set_phase(Phase::Running);
        });
    }

    pub fn record_spawn_failure(&self, role: Role, error: &str) {
        self.update(role, |s| {
            s.pid = None;
            s.last_error = Some(error.to_string());
            s.set_phase(Phase::Failed);
        });
    }

    pub fn record_exit(&self, role: Role, report: ExitReport) {
        self.update(role, |s| {
            s.pid = None;
            s.last_exit = Some(report);
            s.set_phase(if report.success() { Phase::Exited } else { Phase::Failed });
        });
    }

    pub fn record_restarting(&self, role: Role) {
        self.update(role, |s| {
            s.restarts += 1;
            s.set_phase(Phase::Restarting);
        });
    }

    /// Mark a running process ready. Ignored unless it is still running.
    pub fn record_ready(&self, role: Role) -> bool {
        let mut marked = false;
        self.update(role, |s| {
            if s.phase == Phase::Running {
                s.set_phase(Phase::Ready);
                marked = true;
            }
        });
        marked
    }

    /// Mark a process as given up on. The phase keeps reflecting how it
    /// last ended.
    pub fn record_gave_up(&self, role: Role, reason: &str) {
        self.update(role, |s| {
            if s.phase.is_up() || s.phase == Phase::Restarting {
                s.set_phase(Phase::Failed);
            }
            if s.last_error.is_none() {
                s.last_error = Some(reason.to_string());
            }
        });
    }

    pub fn record_detached(&self, role: Role) {
        self.update(role, |s| {
            if s.phase.is_up() {
                s.set_phase(Phase::Detached);
            }
        });
    }
}

impl Default for StatusRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_pending_and_unhealthy() {
        let registry = StatusRegistry::new();
        assert_eq!(registry.phase(Role::Worker), Phase::Pending);
        assert_eq!(registry.phase(Role::Server), Phase::Pending);
        assert!(!registry.is_healthy());
    }

    #[test]
    fn test_healthy_only_when_both_up() {
        let registry = StatusRegistry::new();
        registry.record_spawn(Role::Worker, Some(10));
        assert!(!registry.is_healthy());

        registry.record_spawn(Role::Server, Some(11));
        assert!(registry.is_healthy());
        assert!(registry.record_ready(Role::Server));
        assert!(registry.is_healthy());

        registry.record_exit(Role::Worker, ExitReport { code: Some(1), signal: None });
        assert!(!registry.is_healthy());
        assert_eq!(registry.phase(Role::Worker), Phase::Failed);
    }

    #[test]
    fn test_restarts_are_counted() {
        let registry = StatusRegistry::new();
        registry.record_spawn(Role::Worker, Some(10));
        registry.record_exit(Role::Worker, ExitReport { code: Some(2), signal: None });
        registry.record_restarting(Role::Worker);
        registry.record_spawn(Role::Worker, Some(12));

        let worker = registry.get(Role::Worker);
        assert_eq!(worker.phase, Phase::Running);
        assert_eq!(worker.starts, 2);
        assert_eq!(worker.restarts, 1);
        assert_eq!(worker.pid, Some(12));
        assert_eq!(worker.last_exit.and_then(|e| e.code), Some(2));
    }

    #[test]
    fn test_ready_after_exit_is_ignored() {
        let registry = StatusRegistry::new();
        registry.record_spawn(Role::Server, Some(20));
        registry.record_exit(Role::Server, ExitReport { code: Some(0), signal: None });
        assert!(!registry.record_ready(Role::Server));
        assert_eq!(registry.phase(Role::Server), Phase::Exited);
    }

    #[test]
    fn test_spawn_failure_keeps_error() {
        let registry = StatusRegistry::new();
        registry.record_spawn_failure(Role::Worker, "no such file");
        registry.record_gave_up(Role::Worker, "restart policy exhausted");

        let worker = registry.get(Role::Worker);
        assert_eq!(worker.phase, Phase::Failed);
        assert_eq!(worker.last_error.as_deref(), Some("no such file"));
    }
}
