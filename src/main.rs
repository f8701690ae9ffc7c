//! duo-entrypoint
//!
//! Container entrypoint that runs a messaging-bot worker in the background
//! and an HTTP API server in the foreground.
//!
//! # Architecture Overview
//!
//! ```text
//!   container runtime
//!         │ SIGTERM / SIGINT
//!         ▼
//!   ┌──────────────────────────────────────────────────────────┐
//!   │                     duo-entrypoint                        │
//!   │                                                           │
//!   │  config ──▶ supervisor ──┬──▶ worker monitor ──▶ [bot]    │  1. background
//!   │                          │      restart policy + backoff  │
//!   │                          └──▶ server (waited on) ──▶ [api]│  2. foreground
//!   │                                 readiness probe           │
//!   │                                                           │
//!   │  lifecycle: signals → shutdown broadcast → SIGTERM both   │
//!   │  health registry ──▶ status server (/health, /status)     │
//!   │  observability: tracing logs, prometheus metrics          │
//!   └──────────────────────────────────────────────────────────┘
//!         │
//!         ▼ exit code = server exit code (128 + signal when killed)
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tokio::net::TcpListener;

use duo_entrypoint::config::{load_config, EntrypointConfig};
use duo_entrypoint::lifecycle::{signals, Shutdown, ShutdownReason};
use duo_entrypoint::observability::{logging, metrics};
use duo_entrypoint::{StatusServer, Supervisor, SupervisorError};

/// Exit code for configuration errors.
const CONFIG_ERROR_EXIT: u8 = 2;

#[derive(Parser)]
#[command(name = "duo-entrypoint", version)]
#[command(about = "Run a background worker and a foreground HTTP server in one container")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, env = "ENTRYPOINT_CONFIG")]
    config: Option<PathBuf>,

    /// Validate the configuration and exit without starting anything.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("duo-entrypoint: {e}");
            return ExitCode::from(CONFIG_ERROR_EXIT);
        }
    };

    if cli.check {
        println!("configuration OK");
        return ExitCode::SUCCESS;
    }

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "duo-entrypoint starting");
    tracing::info!(
        host = %config.server.host,
        port = config.server.port,
        worker_restart = ?config.worker.restart,
        grace_secs = config.supervisor.shutdown_grace_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        start_metrics(&config);
    }

    let supervisor = Supervisor::new(config.clone());

    let _signals = match signals::listen(supervisor.shutdown_handle()) {
        Ok(task) => task,
        Err(e) => {
            tracing::error!(error = %e, "Failed to install signal handlers");
            return ExitCode::FAILURE;
        }
    };

    let status_stop = Shutdown::new();
    if config.observability.status_enabled {
        start_status_server(&config, &supervisor, &status_stop).await;
    }

    let code = match supervisor.run().await {
        Ok(outcome) => ExitCode::from(outcome.exit_code()),
        Err(e @ SupervisorError::Interrupted(_)) => {
            tracing::info!(reason = %e, "Stopped before starting processes");
            ExitCode::from(e.exit_code())
        }
        Err(e) => {
            tracing::error!(error = %e, "Supervisor failed");
            ExitCode::from(e.exit_code())
        }
    };

    status_stop.trigger(ShutdownReason::ServerExited);
    code
}

fn start_metrics(config: &EntrypointConfig) {
    match config.observability.metrics_address.parse::<SocketAddr>() {
        Ok(addr) => {
            if let Err(e) = metrics::init_metrics(addr) {
                tracing::error!(error = %e, "Failed to start metrics exporter");
            }
        }
        Err(_) => tracing::error!(
            metrics_address = %config.observability.metrics_address,
            "Failed to parse metrics address"
        ),
    }
}

/// The status server is best effort: failing to bind it is logged and the
/// supervised processes start anyway.
async fn start_status_server(config: &EntrypointConfig, supervisor: &Supervisor, stop: &Shutdown) {
    let address = &config.observability.status_address;
    match TcpListener::bind(address).await {
        Ok(listener) => {
            let server = StatusServer::new(supervisor.registry());
            let stop = stop.subscribe();
            tokio::spawn(async move {
                if let Err(e) = server.run(listener, stop).await {
                    tracing::error!(error = %e, "Status server failed");
                }
            });
        }
        Err(e) => tracing::error!(address = %address, error = %e, "Failed to bind status server"),
    }
}
