//! Child process subsystem.
//!
//! # Data Flow
//! ```text
//! WorkerConfig / ServerConfig
//!     → spec.rs (ProcessSpec: program, args, env, cwd)
//!     → launcher.rs (spawn background / foreground child)
//!     → exit.rs (ExitReport from the OS exit status)
//!     → terminate.rs (SIGTERM → grace → SIGKILL)
//! ```
//!
//! # Design Decisions
//! - Every spawn returns an explicit `Result`; nothing is fire-and-forget
//! - Children inherit stdout/stderr; there is no log multiplexing
//! - Unix only: exit statuses and signals use Unix semantics

pub mod exit;
pub mod launcher;
pub mod spec;
pub mod terminate;

use std::fmt;

use serde::Serialize;

pub use exit::ExitReport;
pub use launcher::{spawn_background, spawn_foreground, LaunchError};
pub use spec::ProcessSpec;
pub use terminate::terminate;

/// Which of the two supervised processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The messaging-bot worker, started in the background.
    Worker,
    /// The HTTP API server, started in the foreground.
    Server,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Worker => "worker",
            Role::Server => "server",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
