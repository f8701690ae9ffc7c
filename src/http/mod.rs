//! HTTP status subsystem.
//!
//! # Data Flow
//! ```text
//! GET /health → handlers.rs → StatusRegistry::is_healthy → 200 | 503
//! GET /status → handlers.rs → StatusRegistry::snapshot   → JSON
//! ```

pub mod handlers;
pub mod server;

pub use server::StatusServer;
