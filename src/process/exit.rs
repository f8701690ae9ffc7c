//! Exit status reporting.

use std::os::unix::process::ExitStatusExt;
use std::process::ExitStatus;

use serde::Serialize;

/// How a child process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExitReport {
    /// Exit code, when the process exited normally.
    pub code: Option<i32>,
    /// Terminating signal number, when the process was killed.
    pub signal: Option<i32>,
}

impl ExitReport {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Shell-style exit code: the code itself, or `128 + signal`.
    pub fn exit_code(&self) -> i32 {
        match (self.code, self.signal) {
            (Some(code), _) => code,
            (None, Some(signal)) => 128 + signal,
            (None, None) => 1,
        }
    }

    /// Metric/log label for the outcome.
    pub fn outcome(&self) -> &'static str {
        if self.success() {
            "success"
        } else if self.signal.is_some() {
            "signaled"
        } else {
            "failure"
        }
    }
}

impl From<ExitStatus> for ExitReport {
    fn from(status: ExitStatus) -> Self {
        Self {
            code: status.code(),
            signal: status.signal(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maps_wait_statuses() {
        // Raw wait(2) statuses: exit code in the high byte, signal in the low bits.
        let ok = ExitReport::from(ExitStatus::from_raw(0));
        assert!(ok.success());
        assert_eq!(ok.exit_code(), 0);

        let failed = ExitReport::from(ExitStatus::from_raw(3 << 8));
        assert_eq!(failed.code, Some(3));
        assert_eq!(failed.outcome(), "failure");

        let killed = ExitReport::from(ExitStatus::from_raw(15));
        assert_eq!(killed.signal, Some(15));
        assert_eq!(killed.exit_code(), 143);
        assert_eq!(killed.outcome(), "signaled");
    }
}
