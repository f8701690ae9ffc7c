//! Stopping a child: SIGTERM, then SIGKILL after a grace period.

use std::future::Future;
use std::io;
use std::process::ExitStatus;
use std::time::Duration;

use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tokio::process::Child;

use crate::process::Role;

/// Deliver `signal` to a process id. A process that is already gone is not
/// an error.
pub fn send_signal(pid: u32, signal: Signal) -> io::Result<()> {
    let pid = i32::try_from(pid).map_err(|_| io::Error::from(io::ErrorKind::InvalidInput))?;
    match kill(Pid::from_raw(pid), signal) {
        Ok(()) | Err(Errno::ESRCH) => Ok(()),
        Err(errno) => Err(io::Error::from(errno)),
    }
}

/// Ask `child` to stop with SIGTERM and wait for it. The child is killed
/// with SIGKILL when `grace` elapses or when `force` completes first.
pub async fn terminate<F>(
    child: &mut Child,
    role: Role,
    grace: Duration,
    force: F,
) -> io::Result<ExitStatus>
where
    F: Future<Output = ()>,
{
    let Some(pid) = child.id() else {
        // Already reaped; `wait` returns the cached status.
        return child.wait().await;
    };

    tracing::info!(role = %role, pid, grace_secs = grace.as_secs_f64(), "Sending SIGTERM");
    send_signal(pid, Signal::SIGTERM)?;

    tokio::select! {
        status = child.wait() => return status,
        _ = tokio::time::sleep(grace) => {
            tracing::warn!(role = %role, pid, "Grace period elapsed, sending SIGKILL");
        }
        _ = force => {
            tracing::warn!(role = %role, pid, "Forced stop requested, sending SIGKILL");
        }
    }

    child.kill().await?;
    child.wait().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::process::ExitStatusExt;
    use std::time::Instant;
    use tokio::process::Command;

    #[tokio::test]
    async fn test_sigterm_stops_cooperative_child() {
        let mut child = Command::new("sleep").arg("30").spawn().unwrap();
        let status = terminate(&mut child, Role::Worker, Duration::from_secs(5), std::future::pending())
            .await
            .unwrap();
        assert_eq!(status.signal(), Some(15));
    }

    #[tokio::test]
    async fn test_stubborn_child_is_killed_after_grace() {
        let mut child = Command::new("sh")
            .args(["-c", "trap '' TERM; sleep 30 & wait"])
            .spawn()
            .unwrap();
        // Give the shell time to install its trap.
        tokio::time::sleep(Duration::from_millis(200)).await;

        let started = Instant::now();
        let status = terminate(&mut child, Role::Server, Duration::from_millis(300), std::future::pending())
            .await
            .unwrap();
        assert_eq!(status.signal(), Some(9));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_force_future_skips_the_grace_period() {
        let mut child = Command::new("sh")
            .args(["-c", "trap '' TERM; sleep 30 & wait"])
            .spawn()
            .unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        let started = Instant::now();
        let status = terminate(&mut child, Role::Server, Duration::from_secs(60), async {})
            .await
            .unwrap();
        assert_eq!(status.signal(), Some(9));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_signalling_a_missing_process_is_ok() {
        // PIDs near i32::MAX are never allocated on Linux.
        assert!(send_signal(i32::MAX as u32 - 1, Signal::SIGTERM).is_ok());
    }
}
