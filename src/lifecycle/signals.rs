//! OS signal handling.
//!
//! # Responsibilities
//! - Register signal handlers (SIGTERM, SIGINT)
//! - Translate signals to shutdown reasons
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - First SIGTERM/SIGINT requests a graceful stop of both children
//! - Multiple SIGTERM/SIGINT trigger forced shutdown

use std::io;

use tokio::signal::unix::{signal, SignalKind};
use tokio::task::JoinHandle;

use crate::lifecycle::{Shutdown, ShutdownReason};

/// Install SIGTERM/SIGINT handlers and forward them to `shutdown`.
///
/// Handlers are installed before this returns. A signal that arrives before
/// anyone subscribes is still visible through [`Shutdown::requested`].
pub fn listen(shutdown: Shutdown) -> io::Result<JoinHandle<()>> {
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    Ok(tokio::spawn(async move {
        let mut received = 0u32;
        loop {
            let name = tokio::select! {
                Some(()) = sigterm.recv() => "SIGTERM",
                Some(()) = sigint.recv() => "SIGINT",
                else => break,
            };
            received += 1;

            if received == 1 {
                tracing::info!(signal = name, "Shutdown signal received");
                shutdown.trigger(ShutdownReason::Signal(name));
            } else {
                tracing::warn!(signal = name, count = received, "Repeated signal, forcing shutdown");
                shutdown.trigger(ShutdownReason::Escalate);
            }
        }
    }))
}
