//! Upstream reconciliation subsystem.
//!
//! # Data Flow
//! ```text
//! Register:
//!     identity.rs (node key, derived upstream id)
//!     → reconciler.rs create_or_join
//!         → upstream absent:  PUT {name, type, nodes: {node: 1}}
//!         → upstream present: GET → add node if missing → PUT full document
//!
//! Deregister:
//!     reconciler.rs remove_node
//!         → GET → node present? → PATCH {nodes: {node: null, ..}}
//! ```
//!
//! # Design Decisions
//! - The gateway's node set is the single source of truth
//! - Only this instance's own node key is ever added or removed
//! - Removing the last node leaves an empty upstream in place so routes
//!   bound to its id keep resolving
//! - Concurrent joins under one id can race on fetch-modify-PUT; the admin
//!   API has no conditional write, so the window is narrowed with optional
//!   jitter, not closed

pub mod identity;
pub mod reconciler;

pub use identity::{ServiceIdentity, UpstreamRef};
pub use reconciler::{JoinOutcome, Reconciler, RemoveOutcome};
