//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with key/value fields
//!       (service, upstream_id, node, health_path, status, attempt)
//!
//! Binaries consume:
//!     → logging.rs (EnvFilter + fmt layer on stdout)
//! ```
//!
//! # Design Decisions
//! - Log level configurable via config and environment
//! - Admin API keys never appear in log fields

pub mod logging;
