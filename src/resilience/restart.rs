//! Restart decisions for the background worker.

use crate::config::RestartPolicy;
use crate::process::ExitReport;

/// How one run of the worker ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The process ran and exited.
    Exited(ExitReport),
    /// The process could not be started.
    SpawnFailed,
    /// The process was started but its status could not be collected.
    Lost,
}

impl Termination {
    pub fn is_failure(&self) -> bool {
        match self {
            Termination::Exited(report) => !report.success(),
            Termination::SpawnFailed | Termination::Lost => true,
        }
    }
}

/// Decide whether to start the worker again after `termination`, given how
/// many restarts already happened.
pub fn should_restart(
    policy: RestartPolicy,
    termination: &Termination,
    restarts_done: u32,
    max_restarts: Option<u32>,
) -> bool {
    if max_restarts.is_some_and(|max| restarts_done >= max) {
        return false;
    }

    match policy {
        RestartPolicy::None => false,
        RestartPolicy::Always => true,
        RestartPolicy::OnFailure => termination.is_failure(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLEAN: Termination = Termination::Exited(ExitReport { code: Some(0), signal: None });
    const CRASHED: Termination = Termination::Exited(ExitReport { code: Some(1), signal: None });
    const KILLED: Termination = Termination::Exited(ExitReport { code: None, signal: Some(9) });

    #[test]
    fn test_none_never_restarts() {
        assert!(!should_restart(RestartPolicy::None, &CRASHED, 0, None));
        assert!(!should_restart(RestartPolicy::None, &Termination::SpawnFailed, 0, None));
    }

    #[test]
    fn test_on_failure_ignores_clean_exits() {
        assert!(!should_restart(RestartPolicy::OnFailure, &CLEAN, 0, None));
        assert!(should_restart(RestartPolicy::OnFailure, &CRASHED, 0, None));
        assert!(should_restart(RestartPolicy::OnFailure, &KILLED, 0, None));
        assert!(should_restart(RestartPolicy::OnFailure, &Termination::SpawnFailed, 0, None));
        assert!(should_restart(RestartPolicy::OnFailure, &Termination::Lost, 0, None));
    }

    #[test]
    fn test_always_restarts_clean_exits() {
        assert!(should_restart(RestartPolicy::Always, &CLEAN, 3, None));
    }

    #[test]
    fn test_budget_caps_restarts() {
        assert!(should_restart(RestartPolicy::Always, &CRASHED, 4, Some(5)));
        assert!(!should_restart(RestartPolicy::Always, &CRASHED, 5, Some(5)));
        assert!(!should_restart(RestartPolicy::OnFailure, &CRASHED, 0, Some(0)));
    }
}
