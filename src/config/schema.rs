//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the entrypoint.
//! All types derive Serde traits for deserialization from config files, and
//! every field has a default so that an empty file reproduces the stock
//! container: `python telegram-bot/bot.py` in the background and
//! `uvicorn app.main:app` on `0.0.0.0:8000` in the foreground.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Placeholder replaced with the server bind host in server arguments.
pub const HOST_PLACEHOLDER: &str = "{host}";

/// Placeholder replaced with the server bind port in server arguments.
pub const PORT_PLACEHOLDER: &str = "{port}";

/// Root configuration for the entrypoint.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct EntrypointConfig {
    /// Background worker (messaging bot) settings.
    pub worker: WorkerConfig,

    /// Foreground HTTP API server settings.
    pub server: ServerConfig,

    /// Supervision behavior shared by both processes.
    pub supervisor: SupervisorConfig,

    /// Logging, status endpoint and metrics.
    pub observability: ObservabilityConfig,
}

/// Background worker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Program to execute, resolved through `PATH` when not absolute.
    pub program: String,

    /// Arguments passed to the program.
    pub args: Vec<String>,

    /// Extra environment variables layered on top of the inherited ones.
    pub env: BTreeMap<String, String>,

    /// Working directory for the child (inherits ours when unset).
    pub working_dir: Option<PathBuf>,

    /// When to restart the worker after it exits.
    pub restart: RestartPolicy,

    /// Upper bound on restarts; `None` means unbounded.
    pub max_restarts: Option<u32>,

    /// Base delay for exponential restart backoff in milliseconds.
    pub backoff_base_ms: u64,

    /// Maximum restart backoff in milliseconds.
    pub backoff_max_ms: u64,

    /// What to do once the restart policy gives up on the worker.
    pub on_give_up: GiveUpAction,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        let mut env = BTreeMap::new();
        env.insert("BACKEND_URL".to_string(), "http://localhost:8000".to_string());

        Self {
            program: "python".to_string(),
            args: vec!["telegram-bot/bot.py".to_string()],
            env,
            working_dir: None,
            restart: RestartPolicy::OnFailure,
            max_restarts: Some(5),
            backoff_base_ms: 500,
            backoff_max_ms: 30_000,
            on_give_up: GiveUpAction::Degrade,
        }
    }
}

/// Restart policy for a supervised process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RestartPolicy {
    /// Never restart.
    None,
    /// Restart after every exit, successful or not.
    Always,
    /// Restart only after a non-zero exit, a signal death or a spawn failure.
    OnFailure,
}

/// Action taken when the worker will not be restarted any more.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum GiveUpAction {
    /// Keep the server running and report `degraded`.
    Degrade,
    /// Stop the server and exit non-zero.
    Shutdown,
}

/// Foreground server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Program to execute, resolved through `PATH` when not absolute.
    pub program: String,

    /// Arguments passed to the program. `{host}` and `{port}` are substituted.
    pub args: Vec<String>,

    /// Extra environment variables layered on top of the inherited ones.
    pub env: BTreeMap<String, String>,

    /// Working directory for the child (inherits ours when unset).
    pub working_dir: Option<PathBuf>,

    /// Bind host handed to the server.
    pub host: String,

    /// Bind port handed to the server.
    pub port: u16,

    /// Path probed to decide the server is ready.
    pub health_path: String,

    /// Enable the readiness probe.
    pub readiness_probe: bool,

    /// Give up probing after this many seconds.
    pub readiness_timeout_secs: u64,

    /// Delay between probes in milliseconds.
    pub probe_interval_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            program: "uvicorn".to_string(),
            args: vec![
                "app.main:app".to_string(),
                "--host".to_string(),
                HOST_PLACEHOLDER.to_string(),
                "--port".to_string(),
                PORT_PLACEHOLDER.to_string(),
            ],
            env: BTreeMap::new(),
            working_dir: None,
            host: "0.0.0.0".to_string(),
            port: 8000,
            health_path: "/health".to_string(),
            readiness_probe: true,
            readiness_timeout_secs: 30,
            probe_interval_ms: 500,
        }
    }
}

impl ServerConfig {
    /// Server arguments with `{host}` and `{port}` substituted.
    pub fn rendered_args(&self) -> Vec<String> {
        let port = self.port.to_string();
        self.args
            .iter()
            .map(|arg| {
                arg.replace(HOST_PLACEHOLDER, &self.host)
                    .replace(PORT_PLACEHOLDER, &port)
            })
            .collect()
    }
}

/// Supervision settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SupervisorConfig {
    /// Time a child gets between SIGTERM and SIGKILL.
    pub shutdown_grace_secs: u64,

    /// Stop the worker when the server exits. When false the worker is
    /// released and keeps running after the entrypoint returns.
    pub stop_worker_on_exit: bool,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            shutdown_grace_secs: 10,
            stop_worker_on_exit: true,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Serve `/health` and `/status`.
    pub status_enabled: bool,

    /// Status endpoint bind address.
    pub status_address: String,

    /// Enable the Prometheus exporter.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            status_enabled: true,
            status_address: "127.0.0.1:8081".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
