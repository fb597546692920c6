//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (defaults + semantic checks, in a fixed order)
//!     → ServicePlan (identity, upstream ref, normalized health config)
//!     → owned by the Registration for its whole lifetime
//! ```
//!
//! # Design Decisions
//! - Every field has a default so minimal configs parse
//! - Validation never touches the network
//! - The health integration mode is code, not data: it is chosen on the
//!   registration builder, never in the file

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, LoadError};
pub use schema::{
    AdminClientConfig, HealthCheckConfig, ObservabilityConfig, RegistrationConfig, RouteConfig,
    UpstreamConfig,
};
pub use validation::{validate, ConfigError, ServicePlan};
