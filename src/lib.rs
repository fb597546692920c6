//! Gateway upstream self-registration.
//!
//! A service instance joins a gateway upstream as one `host:port` node,
//! exposes a health route, and removes its node again on shutdown.
//!
//! ```text
//!     config ──▶ lifecycle::Registration ──▶ upstream::Reconciler ──▶ admin::AdminClient ──▶ gateway
//!                        │                                                  │
//!                        ▼                                                  ▼
//!                 health::HealthService                          resilience (retry/backoff)
//!          (self-hosted | server | router adapter)
//! ```

pub mod admin;
pub mod config;
pub mod error;
pub mod health;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod upstream;

pub use config::{load_config, RegistrationConfig};
pub use error::{Error, ErrorCategory, Result};
pub use health::{RouterAdapter, SharedServer};
pub use lifecycle::{Registration, RegistrationBuilder, RegistrationState};
