//! Health integration errors.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinError;

/// Boxed error returned by caller-supplied route registration callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors mounting, serving or tearing down the health route. Never retried.
#[derive(Debug, Error)]
pub enum HealthError {
    /// The external server has no root handler to wrap.
    #[error("http server has no handler to wrap")]
    MissingHandler,

    /// The caller's route registration callback failed.
    #[error("route registration failed: {0}")]
    Register(#[source] BoxError),

    #[error("failed to bind health listener on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("health listener failed: {0}")]
    Serve(#[source] std::io::Error),

    #[error("health listener task failed: {0}")]
    Join(#[from] JoinError),

    #[error("health listener did not stop within {0:?}")]
    ShutdownTimeout(Duration),

    #[error("health check is already active")]
    AlreadyActive,
}
