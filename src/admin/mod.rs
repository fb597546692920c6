//! Gateway admin API subsystem.
//!
//! Only the subset of the admin API used for self-registration is modeled:
//!
//! | Operation              | Method | Path               | Success  |
//! |------------------------|--------|--------------------|----------|
//! | check/get upstream     | GET    | `/upstreams/{id}`  | 200, 404 |
//! | create/replace upstream| PUT    | `/upstreams/{id}`  | 200, 201 |
//! | patch upstream nodes   | PATCH  | `/upstreams/{id}`  | 200, 201 |
//! | delete upstream        | DELETE | `/upstreams/{id}`  | 200, 204 |
//! | create/replace route   | PUT    | `/routes/{id}`     | 200, 201 |
//! | delete route           | DELETE | `/routes/{id}`     | 200, 204 |

pub mod client;
pub mod types;

pub use client::AdminClient;
pub use types::{AdminError, AdminResult, NodesPatch, RouteDocument, UpstreamDocument};
