//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (ports, delays, timeouts)
//! - Check that addresses parse before anything binds them
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: EntrypointConfig → Result<(), Vec<ValidationError>>
//! - Runs before any child process is spawned
//! - Only the entrypoint's own settings are checked; the children's
//!   configuration is theirs to validate

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::EntrypointConfig;

/// Longest accepted restart delay: one day.
pub const MAX_BACKOFF_MS: u64 = 86_400_000;

/// Longest accepted readiness timeout: one day.
pub const MAX_READINESS_TIMEOUT_SECS: u64 = 86_400;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{role}.program must not be empty")]
    EmptyProgram { role: &'static str },

    #[error("server.host must not be empty")]
    EmptyHost,

    #[error("server.port must be non-zero")]
    ZeroPort,

    #[error("server.health_path must start with '/' (got {0:?})")]
    HealthPath(String),

    #[error("server.probe_interval_ms must be non-zero")]
    ZeroProbeInterval,

    #[error("worker.backoff_base_ms must be non-zero")]
    ZeroBackoff,

    #[error("worker.backoff_base_ms ({base}) exceeds worker.backoff_max_ms ({max})")]
    BackoffRange { base: u64, max: u64 },

    #[error("{field} ({value}) exceeds the limit of {limit}")]
    TooLarge { field: &'static str, value: u64, limit: u64 },

    #[error("supervisor.shutdown_grace_secs must be non-zero")]
    ZeroGrace,

    #[error("{field} is not a valid socket address: {value:?}")]
    Address { field: &'static str, value: String },

    #[error("{role}.env has an invalid variable name {name:?}")]
    EnvName { role: &'static str, name: String },
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &EntrypointConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.worker.program.trim().is_empty() {
        errors.push(ValidationError::EmptyProgram { role: "worker" });
    }
    if config.server.program.trim().is_empty() {
        errors.push(ValidationError::EmptyProgram { role: "server" });
    }

    for name in config.worker.env.keys() {
        if !is_valid_env_name(name) {
            errors.push(ValidationError::EnvName { role: "worker", name: name.clone() });
        }
    }
    for name in config.server.env.keys() {
        if !is_valid_env_name(name) {
            errors.push(ValidationError::EnvName { role: "server", name: name.clone() });
        }
    }

    if config.server.host.trim().is_empty() {
        errors.push(ValidationError::EmptyHost);
    }
    if config.server.port == 0 {
        errors.push(ValidationError::ZeroPort);
    }
    if !config.server.health_path.starts_with('/') {
        errors.push(ValidationError::HealthPath(config.server.health_path.clone()));
    }
    if config.server.readiness_probe && config.server.probe_interval_ms == 0 {
        errors.push(ValidationError::ZeroProbeInterval);
    }
    if config.server.readiness_timeout_secs > MAX_READINESS_TIMEOUT_SECS {
        errors.push(ValidationError::TooLarge {
            field: "server.readiness_timeout_secs",
            value: config.server.readiness_timeout_secs,
            limit: MAX_READINESS_TIMEOUT_SECS,
        });
    }

    if config.worker.backoff_base_ms == 0 {
        errors.push(ValidationError::ZeroBackoff);
    } else if config.worker.backoff_base_ms > config.worker.backoff_max_ms {
        errors.push(ValidationError::BackoffRange {
            base: config.worker.backoff_base_ms,
            max: config.worker.backoff_max_ms,
        });
    }
    if config.worker.backoff_max_ms > MAX_BACKOFF_MS {
        errors.push(ValidationError::TooLarge {
            field: "worker.backoff_max_ms",
            value: config.worker.backoff_max_ms,
            limit: MAX_BACKOFF_MS,
        });
    }

    if config.supervisor.shutdown_grace_secs == 0 {
        errors.push(ValidationError::ZeroGrace);
    }

    let obs = &config.observability;
    if obs.status_enabled && obs.status_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::Address {
            field: "observability.status_address",
            value: obs.status_address.clone(),
        });
    }
    if obs.metrics_enabled && obs.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::Address {
            field: "observability.metrics_address",
            value: obs.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_valid_env_name(name: &str) -> bool {
    !name.is_empty() && !name.contains('=') && !name.contains('\0')
}
