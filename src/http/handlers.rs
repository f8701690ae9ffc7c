use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use uuid::Uuid;

use crate::health::{Phase, ProcessStatus, StatusRegistry};
use crate::process::Role;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub worker: Phase,
    pub server: Phase,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub version: &'static str,
    pub run_id: Uuid,
    pub uptime_secs: u64,
    pub healthy: bool,
    pub processes: Vec<ProcessStatus>,
}

/// 200 when both processes are up, 503 otherwise.
pub async fn get_health(
    State(registry): State<Arc<StatusRegistry>>,
) -> (StatusCode, Json<HealthResponse>) {
    let healthy = registry.is_healthy();
    let body = HealthResponse {
        status: if healthy { "healthy" } else { "degraded" },
        worker: registry.phase(Role::Worker),
        server: registry.phase(Role::Server),
    };
    let code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(body))
}

pub async fn get_status(State(registry): State<Arc<StatusRegistry>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION"),
        run_id: registry.run_id(),
        uptime_secs: registry.uptime().as_secs(),
        healthy: registry.is_healthy(),
        processes: registry.snapshot(),
    })
}
