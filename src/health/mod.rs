//! Health integration subsystem.
//!
//! # Data Flow
//! ```text
//! HealthService::start (service.rs)
//!     → SelfHosted (self_hosted.rs):   bind own listener, serve GET <path> only
//!     → Server (server.rs):            wrap the external server's root router,
//!                                      GET <path> answered here, rest delegated
//!     → Router (router.rs):            caller callback installs the route
//!
//! Every variant serves handler.rs:
//!     200 {"status":"ok","service":"<name>","time":"<RFC3339>"}
//! ```
//!
//! # Design Decisions
//! - One capability, three variants, dispatched by enum match
//! - Only the self-hosted listener is shut down here; the others belong to
//!   the caller
//! - Mount failures are surfaced, never retried

pub mod error;
pub mod handler;
pub mod router;
pub mod self_hosted;
pub mod server;
pub mod service;

pub use error::{BoxError, HealthError};
pub use handler::{HealthHandler, HealthStatus};
pub use router::RouterAdapter;
pub use self_hosted::SelfHosted;
pub use server::{ServerAdapter, SharedServer};
pub use service::{HealthIntegration, HealthService};
