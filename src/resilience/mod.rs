//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Worker exits (or fails to spawn):
//!     → restart.rs (policy + restart budget decide: restart or give up)
//!     → backoff.rs (exponential delay with jitter before the next spawn)
//! ```
//!
//! # Design Decisions
//! - A spawn failure counts as a failed run
//! - Restart budget is per entrypoint run, never replenished
//! - The server is never restarted: its exit ends the entrypoint

pub mod backoff;
pub mod restart;
