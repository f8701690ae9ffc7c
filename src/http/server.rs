//! Status HTTP server.
//!
//! # Responsibilities
//! - Expose `/health` and `/status` for the container runtime and operators
//! - Wire up middleware (tracing, timeout)
//!
//! # Design Decisions
//! - Separate listener from the supervised server; it never shares its port
//! - Read-only: nothing here can start or stop a process

use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::health::StatusRegistry;
use crate::http::handlers::{get_health, get_status};
use crate::lifecycle::{wait_for_shutdown, ShutdownReason};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// HTTP server for supervisor status.
pub struct StatusServer {
    router: Router,
}

impl StatusServer {
    pub fn new(registry: Arc<StatusRegistry>) -> Self {
        Self {
            router: Self::build_router(registry),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    pub fn build_router(registry: Arc<StatusRegistry>) -> Router {
        Router::new()
            .route("/health", get(get_health))
            .route("/status", get(get_status))
            .with_state(registry)
            .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
            .layer(TraceLayer::new_for_http())
    }

    /// Serve on `listener` until a shutdown reason is broadcast.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<ShutdownReason>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Status server listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                wait_for_shutdown(&mut shutdown).await;
            })
            .await?;

        tracing::debug!("Status server stopped");
        Ok(())
    }
}
