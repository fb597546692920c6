//! Configuration validation.
//!
//! # Responsibilities
//! - Apply defaults (host, upstream id, health path)
//! - Reject configs that can never register (no name, port 0)
//! - Check the admin address is an absolute URL when present
//!
//! # Design Decisions
//! - Rules run in a fixed order and stop at the first failure
//! - The admin address may be empty here; it is only required by the
//!   operations that talk to the gateway

use thiserror::Error;

use crate::config::schema::{HealthCheckConfig, RegistrationConfig, DEFAULT_HEALTH_PATH};
use crate::upstream::{ServiceIdentity, UpstreamRef};

/// Configuration errors. Never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("service name is required")]
    MissingName,

    #[error("port must be a positive integer")]
    InvalidPort,

    #[error("admin API address is required")]
    MissingAdminApi,

    #[error("invalid admin API address '{address}': {reason}")]
    InvalidAdminApi { address: String, reason: String },

    #[error("health check path '{0}' must start with '/'")]
    InvalidHealthPath(String),

    #[error("admin API client could not be built: {0}")]
    AdminClient(String),
}

/// Validated, defaulted view of a [`RegistrationConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServicePlan {
    pub identity: ServiceIdentity,
    pub upstream: UpstreamRef,
    pub health: HealthCheckConfig,
}

/// Validate a configuration and derive everything the registration needs.
pub fn validate(config: &RegistrationConfig) -> Result<ServicePlan, ConfigError> {
    let identity = ServiceIdentity::new(&config.name, &config.host, config.port)?;

    if !config.admin_api.is_empty() {
        url::Url::parse(&config.admin_api).map_err(|e| ConfigError::InvalidAdminApi {
            address: config.admin_api.clone(),
            reason: e.to_string(),
        })?;
    }

    let upstream = UpstreamRef::resolve(&config.upstream, &identity);

    let mut health = config.health_check.clone();
    if health.enabled {
        if health.path.is_empty() {
            health.path = DEFAULT_HEALTH_PATH.to_string();
        }
        if !health.path.starts_with('/') {
            return Err(ConfigError::InvalidHealthPath(health.path));
        }
    }

    Ok(ServicePlan {
        identity,
        upstream,
        health,
    })
}
