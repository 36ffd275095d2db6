//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults (ServiceConfig::default)
//!     → loader.rs (optional TOML file)
//!     → loader.rs (environment overrides, e.g. PORT)
//!     → main.rs (CLI flags)
//!     → validation.rs (semantic checks)
//!     → shared by value / Arc with all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once the server starts
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{apply_env_overrides, load_config, ConfigError};
pub use schema::{
    DownloadConfig, ListenerConfig, LogFormat, MetricsConfig, ObservabilityConfig,
    OutboundConfig, RateLimitConfig, SecurityConfig, ServiceConfig,
};
pub use validation::{validate_config, ValidationError};
