//! Service identity and upstream id derivation.

use std::fmt;

use crate::config::schema::{UpstreamConfig, DEFAULT_HOST, DEFAULT_UPSTREAM_TYPE};
use crate::config::validation::ConfigError;

/// Who this instance is, as seen by the gateway. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceIdentity {
    name: String,
    host: String,
    port: u16,
}

impl ServiceIdentity {
    /// Build an identity, defaulting an empty host to loopback.
    pub fn new(name: &str, host: &str, port: u16) -> Result<Self, ConfigError> {
        if name.is_empty() {
            return Err(ConfigError::MissingName);
        }
        let host = if host.is_empty() { DEFAULT_HOST } else { host };
        if port == 0 {
            return Err(ConfigError::InvalidPort);
        }

        Ok(Self {
            name: name.to_string(),
            host: host.to_string(),
            port,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Key of this instance inside an upstream's node set: `host:port`.
    pub fn node_key(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Upstream id used when none is configured: `name_host_port`.
    ///
    /// Restarting the same instance resolves to the same upstream.
    pub fn default_upstream_id(&self) -> String {
        format!("{}_{}_{}", self.name, self.host, self.port)
    }
}

impl fmt::Display for ServiceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.name, self.host, self.port)
    }
}

/// Reference to the gateway upstream an instance joins.
///
/// Every instance configured with the same id joins the same node set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamRef {
    pub id: String,
    pub lb_type: String,
}

impl UpstreamRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            lb_type: DEFAULT_UPSTREAM_TYPE.to_string(),
        }
    }

    /// Resolve the configured upstream, deriving the id from the identity if unset.
    pub fn resolve(config: &UpstreamConfig, identity: &ServiceIdentity) -> Self {
        let id = if config.id.is_empty() {
            let derived = identity.default_upstream_id();
            tracing::info!(upstream_id = %derived, "No upstream id configured, derived one");
            derived
        } else {
            config.id.clone()
        };

        let lb_type = if config.lb_type.is_empty() {
            DEFAULT_UPSTREAM_TYPE.to_string()
        } else {
            config.lb_type.clone()
        };

        Self { id, lb_type }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_key() {
        let identity = ServiceIdentity::new("svc", "10.0.0.5", 9000).unwrap();
        assert_eq!(identity.node_key(), "10.0.0.5:9000");
        assert_eq!(identity.to_string(), "svc@10.0.0.5:9000");
    }

    #[test]
    fn test_default_host() {
        let identity = ServiceIdentity::new("svc", "", 8080).unwrap();
        assert_eq!(identity.host(), "127.0.0.1");
        assert_eq!(identity.node_key(), "127.0.0.1:8080");
    }

    #[test]
    fn test_invalid_identity() {
        assert_eq!(
            ServiceIdentity::new("", "10.0.0.5", 9000),
            Err(ConfigError::MissingName)
        );
        assert_eq!(
            ServiceIdentity::new("svc", "10.0.0.5", 0),
            Err(ConfigError::InvalidPort)
        );
    }

    #[test]
    fn test_upstream_id_is_deterministic() {
        let a = ServiceIdentity::new("svc", "10.0.0.5", 9000).unwrap();
        let b = ServiceIdentity::new("svc", "10.0.0.5", 9000).unwrap();
        let config = UpstreamConfig::default();

        let first = UpstreamRef::resolve(&config, &a);
        let second = UpstreamRef::resolve(&config, &b);
        assert_eq!(first, second);
        assert_eq!(first.id, "svc_10.0.0.5_9000");
    }

    #[test]
    fn test_configured_upstream() {
        let identity = ServiceIdentity::new("svc", "10.0.0.5", 9000).unwrap();
        let config = UpstreamConfig {
            id: "shared".into(),
            lb_type: String::new(),
        };
        let upstream = UpstreamRef::resolve(&config, &identity);
        assert_eq!(upstream.id, "shared");
        assert_eq!(upstream.lb_type, "roundrobin");
    }
}
