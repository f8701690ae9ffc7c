//! Shutdown coordination for the entrypoint.

use std::sync::{Arc, OnceLock};

use serde::Serialize;
use tokio::sync::broadcast::{self, error::RecvError};

/// Why the entrypoint is stopping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "kind", content = "signal")]
pub enum ShutdownReason {
    /// A termination signal reached the entrypoint.
    Signal(&'static str),
    /// A repeated termination signal: stop waiting for children.
    Escalate,
    /// The worker will not be restarted and is configured to take the
    /// container down with it.
    WorkerGaveUp,
    /// The foreground server is gone.
    ServerExited,
}

/// Coordinator for shutdown.
///
/// Provides a broadcast channel that all long-running tasks can subscribe to.
/// A broadcast only reaches existing receivers, so the first reason is also
/// kept for tasks that subscribe late.
#[derive(Debug, Clone)]
pub struct Shutdown {
    /// Broadcast channel sender.
    tx: broadcast::Sender<ShutdownReason>,
    first: Arc<OnceLock<ShutdownReason>>,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(8);
        Self {
            tx,
            first: Arc::new(OnceLock::new()),
        }
    }

    /// Subscribe to shutdown notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<ShutdownReason> {
        self.tx.subscribe()
    }

    /// Broadcast a shutdown reason.
    pub fn trigger(&self, reason: ShutdownReason) {
        tracing::debug!(?reason, "Shutdown triggered");
        let _ = self.first.set(reason);
        let _ = self.tx.send(reason);
    }

    /// The first reason ever triggered, if any.
    pub fn requested(&self) -> Option<ShutdownReason> {
        self.first.get().copied()
    }

    /// Get the number of active subscribers.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait for the next shutdown reason. Never completes once every sender is
/// gone.
pub async fn wait_for_shutdown(rx: &mut broadcast::Receiver<ShutdownReason>) -> ShutdownReason {
    loop {
        match rx.recv().await {
            Ok(reason) => return reason,
            Err(RecvError::Lagged(_)) => continue,
            Err(RecvError::Closed) => std::future::pending::<()>().await,
        }
    }
}

/// Wait until an [`ShutdownReason::Escalate`] is broadcast.
pub async fn wait_for_escalation(rx: &mut broadcast::Receiver<ShutdownReason>) {
    while wait_for_shutdown(rx).await != ShutdownReason::Escalate {}
}
