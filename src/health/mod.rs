//! Health subsystem.
//!
//! # Data Flow
//! ```text
//! Supervisor events
//!     → state.rs (per-process phase, pid, exits, errors)
//!     → /health and /status handlers
//!
//! Server spawned
//!     → probe.rs (poll health path until 2xx or timeout)
//!     → state.rs (Running → Ready)
//! ```
//!
//! # Design Decisions
//! - Healthy means both processes are up; anything else is degraded
//! - Health state is per-process, shared through one registry

pub mod probe;
pub mod state;

pub use probe::{probe_url, ReadinessProbe};
pub use state::{Phase, ProcessStatus, StatusRegistry};
