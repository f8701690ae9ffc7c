//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     first SIGTERM/SIGINT → ShutdownReason::Signal
//!     any further one      → ShutdownReason::Escalate
//!
//! Shutdown (shutdown.rs):
//!     reason broadcast → supervisor stops the server
//!                      → worker monitor stops the worker
//!     Escalate during the grace period → SIGKILL now
//! ```
//!
//! # Design Decisions
//! - Startup is ordered by the supervisor: worker first, then server
//! - Shutdown has timeout: SIGKILL after the grace period
//! - Shutdown reasons are broadcast so every task learns why it stops

pub mod shutdown;
pub mod signals;

pub use shutdown::{wait_for_escalation, wait_for_shutdown, Shutdown, ShutdownReason};
