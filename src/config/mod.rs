//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → env overrides (HOST, PORT, STATUS_ADDRESS, LOG_LEVEL)
//!     → validation.rs (semantic checks)
//!     → EntrypointConfig (validated, immutable)
//!     → handed to the supervisor
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    EntrypointConfig, GiveUpAction, LogFormat, ObservabilityConfig, RestartPolicy, ServerConfig,
    SupervisorConfig, WorkerConfig,
};
