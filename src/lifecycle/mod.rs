//! Service lifecycle subsystem.
//!
//! # Data Flow
//! ```text
//! Registration::new (registration.rs):
//!     Validate config → Derive identity/upstream → Bind health integration
//!
//! Registration::start:
//!     register → create route (if configured) → start health check
//!     → spawn SignalListener (shutdown.rs)
//!
//! SignalListener:
//!     SIGINT/SIGTERM (signals.rs) or stop() → deregister → shutdown(timeout)
//!     → stopped() resolves
//! ```
//!
//! # Design Decisions
//! - Teardown order is fixed: node removal before the health route goes away
//! - The upstream is never deleted on teardown
//! - Shutdown has a timeout: the health listener is aborted after the deadline

pub mod registration;
pub mod shutdown;
pub mod signals;

pub use registration::{Registration, RegistrationBuilder, RegistrationState};
pub use shutdown::{SignalListener, StopReason};
pub use signals::{wait_for_termination, TerminationSignal, TerminationSignals};
