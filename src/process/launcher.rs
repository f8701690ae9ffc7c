//! Background and foreground launchers.
//!
//! # Responsibilities
//! - Spawn the worker without waiting on it
//! - Spawn the server attached to the entrypoint's stdio
//! - Turn spawn failures into typed errors with a shell-style exit code
//!
//! # Design Decisions
//! - Launchers never retry; restart decisions belong to the supervisor
//! - Launchers hand the `Child` back; the caller owns the process from then on

use std::io;

use thiserror::Error;
use tokio::process::Child;

use crate::process::{ProcessSpec, Role};

/// A child could not be started.
#[derive(Debug, Error)]
#[error("failed to start {role} `{program}`: {source}")]
pub struct LaunchError {
    pub role: Role,
    pub program: String,
    #[source]
    pub source: io::Error,
}

impl LaunchError {
    /// Exit code a shell would report for the same failure.
    pub fn exit_code(&self) -> u8 {
        match self.source.kind() {
            io::ErrorKind::NotFound => 127,
            io::ErrorKind::PermissionDenied => 126,
            _ => 1,
        }
    }
}

fn spawn(spec: &ProcessSpec) -> Result<Child, LaunchError> {
    spec.command().spawn().map_err(|source| LaunchError {
        role: spec.role,
        program: spec.program.clone(),
        source,
    })
}

/// Start the worker in the background and return immediately.
pub fn spawn_background(spec: &ProcessSpec) -> Result<Child, LaunchError> {
    tracing::debug!(role = %spec.role, command = %spec.command_line(), "Launching background process");
    spawn(spec)
}

/// Start the server in the foreground. The caller is expected to wait on
/// the returned child.
pub fn spawn_foreground(spec: &ProcessSpec) -> Result<Child, LaunchError> {
    tracing::debug!(role = %spec.role, command = %spec.command_line(), "Launching foreground process");
    spawn(spec)
}
