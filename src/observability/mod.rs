//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Supervisor produces:
//!     → logging.rs (structured log events on stderr)
//!     → metrics.rs (starts, exits, restarts, up gauges)
//!
//! Consumers:
//!     → Container log driver (children write to the same stdout/stderr)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Our logs go to stderr so they never interleave into a child's stdout protocol
//! - JSON format for production, pretty format for development
//! - Metrics are recorded even when no exporter is installed (no-op recorder)

pub mod logging;
pub mod metrics;
