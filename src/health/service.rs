//! Health integration selection and activation state.

use std::net::SocketAddr;
use std::time::Duration;

use crate::config::HealthCheckConfig;
use crate::health::error::HealthError;
use crate::health::handler::HealthHandler;
use crate::health::router::RouterAdapter;
use crate::health::self_hosted::SelfHosted;
use crate::health::server::ServerAdapter;

/// Where the health route gets mounted.
#[derive(Debug)]
pub enum HealthIntegration {
    /// Own listener on the service's port.
    SelfHosted(SelfHosted),
    /// Wrapped around an externally owned server's root handler.
    Server(ServerAdapter),
    /// Handed to a caller-supplied route registration callback.
    Router(RouterAdapter),
}

impl HealthIntegration {
    pub fn kind(&self) -> &'static str {
        match self {
            HealthIntegration::SelfHosted(_) => "self-hosted",
            HealthIntegration::Server(_) => "server",
            HealthIntegration::Router(_) => "router",
        }
    }
}

/// One service's health route and the integration serving it.
///
/// `inactive → active` on a successful `start`, back on `shutdown`. When
/// health checking is disabled both are no-ops.
#[derive(Debug)]
pub struct HealthService {
    handler: HealthHandler,
    config: HealthCheckConfig,
    integration: HealthIntegration,
    active: bool,
}

impl HealthService {
    pub fn new(service: &str, config: HealthCheckConfig, integration: HealthIntegration) -> Self {
        Self {
            handler: HealthHandler::new(service),
            config,
            integration,
            active: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn path(&self) -> &str {
        &self.config.path
    }

    pub fn integration(&self) -> &HealthIntegration {
        &self.integration
    }

    /// Swap the integration. Refused while active.
    pub fn set_integration(&mut self, integration: HealthIntegration) -> Result<(), HealthError> {
        if self.active {
            return Err(HealthError::AlreadyActive);
        }
        self.integration = integration;
        Ok(())
    }

    /// Address of the self-hosted listener, once started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        match &self.integration {
            HealthIntegration::SelfHosted(server) => server.local_addr(),
            _ => None,
        }
    }

    pub async fn start(&mut self) -> Result<(), HealthError> {
        if !self.config.enabled {
            tracing::debug!(service = self.handler.service(), "Health check disabled");
            return Ok(());
        }
        if self.active {
            return Err(HealthError::AlreadyActive);
        }

        let path = self.config.path.as_str();
        match &mut self.integration {
            HealthIntegration::SelfHosted(server) => {
                server.start(path, self.handler.clone()).await?;
            }
            HealthIntegration::Server(adapter) => adapter.mount(path, self.handler.clone())?,
            HealthIntegration::Router(adapter) => adapter.mount(path, self.handler.clone())?,
        }

        self.active = true;
        tracing::info!(
            service = self.handler.service(),
            health_path = path,
            integration = self.integration.kind(),
            "Health check started"
        );
        Ok(())
    }

    /// Only the self-hosted listener has anything to stop; mounted routes
    /// belong to servers this crate does not own.
    pub async fn shutdown(&mut self, timeout: Duration) -> Result<(), HealthError> {
        if !self.config.enabled || !self.active {
            return Ok(());
        }
        self.active = false;

        match &mut self.integration {
            HealthIntegration::SelfHosted(server) => server.shutdown(timeout).await,
            _ => Ok(()),
        }
    }
}
