//! Metrics collection and exposition.
//!
//! # Metrics
//! - `entrypoint_process_starts_total` (counter): successful spawns by role
//! - `entrypoint_spawn_failures_total` (counter): failed spawns by role
//! - `entrypoint_process_exits_total` (counter): exits by role, outcome
//! - `entrypoint_process_up` (gauge): 1=running, 0=not running, by role
//! - `entrypoint_worker_restarts_total` (counter): scheduled worker restarts

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::process::{ExitReport, Role};

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_spawn(role: Role) {
    metrics::counter!("entrypoint_process_starts_total", "role" => role.as_str()).increment(1);
    metrics::gauge!("entrypoint_process_up", "role" => role.as_str()).set(1.0);
}

pub fn record_spawn_failure(role: Role) {
    metrics::counter!("entrypoint_spawn_failures_total", "role" => role.as_str()).increment(1);
    metrics::gauge!("entrypoint_process_up", "role" => role.as_str()).set(0.0);
}

pub fn record_exit(role: Role, report: &ExitReport) {
    metrics::counter!(
        "entrypoint_process_exits_total",
        "role" => role.as_str(),
        "outcome" => report.outcome()
    )
    .increment(1);
    metrics::gauge!("entrypoint_process_up", "role" => role.as_str()).set(0.0);
}

pub fn record_restart() {
    metrics::counter!("entrypoint_worker_restarts_total").increment(1);
}
