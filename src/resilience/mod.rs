//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Admin API call:
//!     → reqwest client timeout (per attempt)
//!     → On failure: retries.rs (check if retryable, retry with backoff)
//!     → backoff.rs (exponential delay, jittered, capped)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every admin call has a deadline
//! - Attempts are bounded, so the worst case is timeout × attempts
//! - Jittered backoff prevents replicas retrying in lockstep

pub mod backoff;
pub mod retries;

pub use retries::RetryPolicy;
