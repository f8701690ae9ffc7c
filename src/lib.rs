//! Container entrypoint that supervises a background worker and a
//! foreground HTTP server.

pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod process;
pub mod resilience;
pub mod supervisor;

pub use config::schema::EntrypointConfig;
pub use http::StatusServer;
pub use lifecycle::Shutdown;
pub use supervisor::{ExitOutcome, Supervisor, SupervisorError, SupervisorEvent};
