//! Crate-level error with stable category tags.

use std::fmt;

use thiserror::Error;

use crate::admin::AdminError;
use crate::config::ConfigError;
use crate::health::HealthError;

/// Failure of a [`Registration`](crate::Registration) operation.
///
/// Branch on [`Error::category`] rather than on message text.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("create upstream failed: {0}")]
    CreateUpstream(#[source] AdminError),

    #[error("create route failed: {0}")]
    CreateRoute(#[source] AdminError),

    #[error("delete node failed: {0}")]
    DeleteNode(#[source] AdminError),

    #[error("delete route failed: {0}")]
    DeleteRoute(#[source] AdminError),

    #[error("delete upstream failed: {0}")]
    DeleteUpstream(#[source] AdminError),

    #[error("start health check failed: {0}")]
    StartHealthCheck(#[source] HealthError),

    #[error("shutdown failed: {0}")]
    Shutdown(#[source] HealthError),
}

/// Stable error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    InvalidConfig,
    CreateUpstreamFailed,
    CreateRouteFailed,
    DeleteNodeFailed,
    DeleteRouteFailed,
    DeleteUpstreamFailed,
    StartHealthCheckFailed,
    ShutdownFailed,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::InvalidConfig => "invalid-config",
            ErrorCategory::CreateUpstreamFailed => "create-upstream-failed",
            ErrorCategory::CreateRouteFailed => "create-route-failed",
            ErrorCategory::DeleteNodeFailed => "delete-node-failed",
            ErrorCategory::DeleteRouteFailed => "delete-route-failed",
            ErrorCategory::DeleteUpstreamFailed => "delete-upstream-failed",
            ErrorCategory::StartHealthCheckFailed => "start-health-check-failed",
            ErrorCategory::ShutdownFailed => "shutdown-failed",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) => ErrorCategory::InvalidConfig,
            Error::CreateUpstream(_) => ErrorCategory::CreateUpstreamFailed,
            Error::CreateRoute(_) => ErrorCategory::CreateRouteFailed,
            Error::DeleteNode(_) => ErrorCategory::DeleteNodeFailed,
            Error::DeleteRoute(_) => ErrorCategory::DeleteRouteFailed,
            Error::DeleteUpstream(_) => ErrorCategory::DeleteUpstreamFailed,
            Error::StartHealthCheck(_) => ErrorCategory::StartHealthCheckFailed,
            Error::Shutdown(_) => ErrorCategory::ShutdownFailed,
        }
    }

    /// HTTP status of the admin response behind this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::CreateUpstream(e)
            | Error::CreateRoute(e)
            | Error::DeleteNode(e)
            | Error::DeleteRoute(e)
            | Error::DeleteUpstream(e) => e.status(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
