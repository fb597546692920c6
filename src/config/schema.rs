//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Host used when the service does not announce one.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Health route mounted when health checking is enabled without a path.
pub const DEFAULT_HEALTH_PATH: &str = "/health";

/// Load-balancing algorithm tag for newly created upstreams.
pub const DEFAULT_UPSTREAM_TYPE: &str = "roundrobin";

/// Seconds the signal-triggered teardown waits for the health listener.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 3;

/// Root configuration for one service registration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RegistrationConfig {
    /// Service name (required).
    pub name: String,

    /// Address the gateway should reach this instance on.
    pub host: String,

    /// Port the gateway should reach this instance on (required, > 0).
    pub port: u16,

    /// Upstream this instance joins.
    pub upstream: UpstreamConfig,

    /// Gateway admin API base address, e.g. `http://apisix:9180/apisix/admin`.
    pub admin_api: String,

    /// Admin API key sent as `X-API-KEY`.
    pub api_key: String,

    /// Health check exposure.
    pub health_check: HealthCheckConfig,

    /// Route created on start, if any.
    pub route: Option<RouteConfig>,

    /// Admin API client timeouts and retries.
    pub client: AdminClientConfig,

    /// Deadline for the health listener teardown after a termination signal.
    pub shutdown_timeout_secs: u64,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            host: String::new(),
            port: 0,
            upstream: UpstreamConfig::default(),
            admin_api: String::new(),
            api_key: String::new(),
            health_check: HealthCheckConfig::default(),
            route: None,
            client: AdminClientConfig::default(),
            shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Upstream selection.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Upstream id; derived from name, host and port when empty.
    pub id: String,

    /// Load-balancing algorithm used when the upstream is created.
    #[serde(rename = "type")]
    pub lb_type: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            id: String::new(),
            lb_type: DEFAULT_UPSTREAM_TYPE.to_string(),
        }
    }
}

/// Health check configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Mount a health route at all.
    pub enabled: bool,

    /// Path of the health route.
    pub path: String,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: DEFAULT_HEALTH_PATH.to_string(),
        }
    }
}

/// Route created on the gateway pointing at this service's upstream.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RouteConfig {
    /// Route id on the gateway.
    pub id: String,

    /// URI pattern matched by the gateway.
    pub uri: String,
}

/// Admin API client configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct AdminClientConfig {
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,

    /// Total attempts per admin call, first try included.
    pub max_attempts: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub retry_wait_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub retry_max_wait_ms: u64,

    /// Upper bound of a random delay before joining an existing upstream.
    /// Zero disables it.
    pub join_jitter_ms: u64,
}

impl Default for AdminClientConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 5_000,
            max_attempts: 3,
            retry_wait_ms: 500,
            retry_max_wait_ms: 2_000,
            join_jitter_ms: 0,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
