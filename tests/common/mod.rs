//! Shared utilities for supervisor integration tests.

use std::net::SocketAddr;
use std::time::Duration;

use axum::{http::StatusCode, routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use duo_entrypoint::config::{EntrypointConfig, GiveUpAction, RestartPolicy};
use duo_entrypoint::process::Role;
use duo_entrypoint::SupervisorEvent;

/// A config running `sh -c <worker>` and `sh -c <server>` with fast
/// timings and no HTTP side channels.
#[allow(dead_code)]
pub fn sh_config(worker: &str, server: &str) -> EntrypointConfig {
    let mut config = EntrypointConfig::default();

    config.worker.program = "sh".into();
    config.worker.args = vec!["-c".into(), worker.into()];
    config.worker.env.clear();
    config.worker.restart = RestartPolicy::None;
    config.worker.backoff_base_ms = 10;
    config.worker.backoff_max_ms = 50;
    config.worker.on_give_up = GiveUpAction::Degrade;

    config.server.program = "sh".into();
    config.server.args = vec!["-c".into(), server.into()];
    config.server.readiness_probe = false;

    config.supervisor.shutdown_grace_secs = 2;
    config.observability.status_enabled = false;
    config
}

/// Drain every event currently buffered in `rx`.
#[allow(dead_code)]
pub fn drain(rx: &mut broadcast::Receiver<SupervisorEvent>) -> Vec<SupervisorEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Roles of `Spawned` events, in order.
#[allow(dead_code)]
pub fn spawn_order(events: &[SupervisorEvent]) -> Vec<Role> {
    events
        .iter()
        .filter_map(|e| match e {
            SupervisorEvent::Spawned { role, .. } => Some(*role),
            _ => None,
        })
        .collect()
}

/// Wait for the first event matching `pred`.
#[allow(dead_code)]
pub async fn wait_for<F>(rx: &mut broadcast::Receiver<SupervisorEvent>, pred: F) -> SupervisorEvent
where
    F: Fn(&SupervisorEvent) -> bool,
{
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            let event = rx.recv().await.expect("event channel closed");
            if pred(&event) {
                return event;
            }
        }
    })
    .await
    .expect("timed out waiting for supervisor event")
}

/// Start a mock HTTP app answering `GET /health` with `status`.
#[allow(dead_code)]
pub async fn start_health_backend(status: StatusCode) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().route("/health", get(move || async move { (status, "{\"status\":\"healthy\"}") }));

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// True while a process with `pid` exists.
#[allow(dead_code)]
pub fn pid_alive(pid: u32) -> bool {
    nix::sys::signal::kill(nix::unistd::Pid::from_raw(pid as i32), None).is_ok()
}
