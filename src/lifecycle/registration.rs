//! Service registration lifecycle.
//!
//! # Responsibilities
//! - Validate configuration and bind the health integration at construction
//! - Register and deregister this instance's node through the reconciler
//! - Start and stop the health route
//! - Tear everything down on a termination signal or an explicit stop
//!
//! # Design Decisions
//! - Construction never touches the network
//! - All mutable state sits behind one async lock, held for the duration of
//!   each operation so register/deregister/health calls never interleave
//! - Background teardown logs failures instead of returning them; there is
//!   no caller left to return them to

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::admin::AdminClient;
use crate::config::{validate, ConfigError, RegistrationConfig, RouteConfig};
use crate::error::{Error, Result};
use crate::health::{
    HealthError, HealthIntegration, HealthService, RouterAdapter, SelfHosted, ServerAdapter,
    SharedServer,
};
use crate::lifecycle::shutdown::{SignalListener, StopReason};
use crate::upstream::{JoinOutcome, Reconciler, RemoveOutcome, ServiceIdentity, UpstreamRef};

/// Registration state as seen by this instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationState {
    Unregistered,
    Registered,
    Deregistered,
}

/// Builds a [`Registration`], choosing the health integration.
///
/// A router adapter wins over an external server; with neither the health
/// route gets its own listener on the service port.
#[derive(Debug)]
pub struct RegistrationBuilder {
    config: RegistrationConfig,
    server: Option<SharedServer>,
    router: Option<RouterAdapter>,
}

impl RegistrationBuilder {
    pub fn new(config: RegistrationConfig) -> Self {
        Self {
            config,
            server: None,
            router: None,
        }
    }

    pub fn with_http_server(mut self, server: SharedServer) -> Self {
        self.server = Some(server);
        self
    }

    pub fn with_router_adapter(mut self, adapter: RouterAdapter) -> Self {
        self.router = Some(adapter);
        self
    }

    pub fn build(self) -> std::result::Result<Registration, ConfigError> {
        let plan = validate(&self.config)?;

        let reconciler = if self.config.admin_api.is_empty() {
            None
        } else {
            let client = AdminClient::new(&self.config.admin_api, &self.config.api_key, &self.config.client)
                .map_err(|e| ConfigError::AdminClient(e.to_string()))?;
            let jitter = Duration::from_millis(self.config.client.join_jitter_ms);
            Some(Reconciler::new(client, jitter))
        };

        let integration = match (self.router, self.server) {
            (Some(router), _) => HealthIntegration::Router(router),
            (None, Some(server)) => HealthIntegration::Server(ServerAdapter::new(server)),
            (None, None) => HealthIntegration::SelfHosted(SelfHosted::new(plan.identity.port())),
        };
        let health = HealthService::new(plan.identity.name(), plan.health, integration);

        tracing::debug!(
            service = %plan.identity,
            upstream_id = %plan.upstream.id,
            integration = health.integration().kind(),
            "Registration configured"
        );

        Ok(Registration {
            shared: Arc::new(Shared {
                identity: plan.identity,
                upstream: plan.upstream,
                route: self.config.route,
                reconciler,
                shutdown_timeout: Duration::from_secs(self.config.shutdown_timeout_secs),
                context: CancellationToken::new(),
                done: CancellationToken::new(),
                inner: Mutex::new(Inner {
                    state: RegistrationState::Unregistered,
                    health,
                    listener: None,
                }),
            }),
        })
    }
}

struct Shared {
    identity: ServiceIdentity,
    upstream: UpstreamRef,
    route: Option<RouteConfig>,
    reconciler: Option<Reconciler>,
    shutdown_timeout: Duration,
    context: CancellationToken,
    done: CancellationToken,
    inner: Mutex<Inner>,
}

struct Inner {
    state: RegistrationState,
    health: HealthService,
    listener: Option<SignalListener>,
}

/// One service instance's presence in a gateway upstream.
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct Registration {
    shared: Arc<Shared>,
}

impl Registration {
    /// Registration with a self-hosted health listener.
    pub fn new(config: RegistrationConfig) -> std::result::Result<Self, ConfigError> {
        RegistrationBuilder::new(config).build()
    }

    pub fn builder(config: RegistrationConfig) -> RegistrationBuilder {
        RegistrationBuilder::new(config)
    }

    pub fn identity(&self) -> &ServiceIdentity {
        &self.shared.identity
    }

    pub fn upstream(&self) -> &UpstreamRef {
        &self.shared.upstream
    }

    pub fn node_key(&self) -> String {
        self.shared.identity.node_key()
    }

    pub async fn state(&self) -> RegistrationState {
        self.shared.inner.lock().await.state
    }

    /// Address of the self-hosted health listener while it runs.
    pub async fn health_addr(&self) -> Option<SocketAddr> {
        self.shared.inner.lock().await.health.local_addr()
    }

    pub async fn health_integration(&self) -> &'static str {
        self.shared.inner.lock().await.health.integration().kind()
    }

    fn reconciler(&self) -> Result<&Reconciler> {
        self.shared
            .reconciler
            .as_ref()
            .ok_or(Error::Config(ConfigError::MissingAdminApi))
    }

    /// Add this instance's node to the upstream, creating the upstream if needed.
    pub async fn register(&self) -> Result<JoinOutcome> {
        let reconciler = self.reconciler()?;
        if !reconciler.client().has_api_key() {
            tracing::warn!(service = %self.shared.identity, "No admin API key configured");
        }

        let mut inner = self.shared.inner.lock().await;
        let outcome = reconciler
            .create_or_join(&self.shared.upstream, self.shared.identity.name(), &self.node_key())
            .await
            .map_err(Error::CreateUpstream)?;
        inner.state = RegistrationState::Registered;

        tracing::info!(
            service = %self.shared.identity,
            upstream_id = %self.shared.upstream.id,
            ?outcome,
            "Service registered"
        );
        Ok(outcome)
    }

    /// Remove this instance's node. The upstream is left in place.
    pub async fn deregister(&self) -> Result<RemoveOutcome> {
        let reconciler = self.reconciler()?;

        let mut inner = self.shared.inner.lock().await;
        let outcome = reconciler
            .remove_node(&self.shared.upstream.id, &self.node_key())
            .await
            .map_err(Error::DeleteNode)?;
        if inner.state == RegistrationState::Registered {
            inner.state = RegistrationState::Deregistered;
        }

        tracing::info!(
            service = %self.shared.identity,
            upstream_id = %self.shared.upstream.id,
            ?outcome,
            "Service deregistered"
        );
        Ok(outcome)
    }

    /// Create or replace the configured route. No-op without a route.
    pub async fn create_route(&self) -> Result<()> {
        let Some(route) = &self.shared.route else {
            return Ok(());
        };
        let reconciler = self.reconciler()?;

        let _inner = self.shared.inner.lock().await;
        reconciler
            .client()
            .create_route(&route.id, self.shared.identity.name(), &route.uri, &self.shared.upstream.id)
            .await
            .map_err(Error::CreateRoute)
    }

    /// Delete the configured route. No-op without a route.
    pub async fn delete_route(&self) -> Result<()> {
        let Some(route) = &self.shared.route else {
            return Ok(());
        };
        let reconciler = self.reconciler()?;

        let _inner = self.shared.inner.lock().await;
        reconciler
            .client()
            .delete_route(&route.id)
            .await
            .map_err(Error::DeleteRoute)
    }

    /// Delete the whole upstream, including other instances' nodes.
    ///
    /// Never called by the lifecycle itself.
    pub async fn delete_upstream(&self) -> Result<()> {
        let reconciler = self.reconciler()?;

        let mut inner = self.shared.inner.lock().await;
        reconciler
            .client()
            .delete_upstream(&self.shared.upstream.id)
            .await
            .map_err(Error::DeleteUpstream)?;
        if inner.state == RegistrationState::Registered {
            inner.state = RegistrationState::Deregistered;
        }
        Ok(())
    }

    /// Mount the health route. No-op when health checking is disabled.
    pub async fn start_health_check(&self) -> Result<()> {
        let mut inner = self.shared.inner.lock().await;
        inner.health.start().await.map_err(Error::StartHealthCheck)
    }

    /// Stop the self-hosted health listener within `timeout`.
    pub async fn shutdown(&self, timeout: Duration) -> Result<()> {
        let mut inner = self.shared.inner.lock().await;
        inner.health.shutdown(timeout).await.map_err(Error::Shutdown)
    }

    /// Register, create the configured route, start the health check, then
    /// tear down in the background on SIGINT/SIGTERM or [`stop`](Self::stop).
    ///
    /// Returns once the listener is installed. A failure after registration
    /// leaves the node registered and installs no listener.
    pub async fn start(&self) -> Result<()> {
        self.register().await?;
        self.create_route().await?;
        self.start_health_check().await?;

        let mut inner = self.shared.inner.lock().await;
        if inner.listener.is_none() {
            // The task keeps the registration alive until teardown ran, even
            // if every caller handle is dropped.
            let registration = self.clone();
            inner.listener = Some(SignalListener::spawn(
                self.shared.context.clone(),
                self.shared.done.clone(),
                move |reason| registration.teardown(reason),
            ));
        }

        tracing::info!(service = %self.shared.identity, "Registration started");
        Ok(())
    }

    /// Trigger the same teardown a termination signal would.
    ///
    /// Without a running listener there is nothing to tear down and
    /// [`stopped`](Self::stopped) resolves immediately.
    pub async fn stop(&self) {
        let inner = self.shared.inner.lock().await;
        self.shared.context.cancel();
        if inner.listener.is_none() {
            self.shared.done.cancel();
        }
    }

    /// Resolves once teardown has finished.
    pub async fn stopped(&self) {
        self.shared.done.cancelled().await
    }

    /// Token cancelled when the registration starts tearing down.
    pub fn context(&self) -> CancellationToken {
        self.shared.context.child_token()
    }

    /// Mount the health route on an external server instead. Refused once active.
    pub async fn set_http_server(&self, server: SharedServer) -> std::result::Result<(), HealthError> {
        self.set_integration(HealthIntegration::Server(ServerAdapter::new(server)))
            .await
    }

    /// Mount the health route through a router callback instead. Refused once active.
    pub async fn set_router_adapter(&self, adapter: RouterAdapter) -> std::result::Result<(), HealthError> {
        self.set_integration(HealthIntegration::Router(adapter)).await
    }

    async fn teardown(self, reason: StopReason) {
        tracing::info!(service = %self.shared.identity, %reason, "Stopping registration");

        if let Err(error) = self.deregister().await {
            tracing::error!(%error, category = %error.category(), "Deregistration failed");
        }
        if let Err(error) = self.shutdown(self.shared.shutdown_timeout).await {
            tracing::error!(%error, category = %error.category(), "Health check shutdown failed");
        }
    }

    async fn set_integration(&self, integration: HealthIntegration) -> std::result::Result<(), HealthError> {
        let kind = integration.kind();
        let mut inner = self.shared.inner.lock().await;
        inner.health.set_integration(integration).inspect_err(|_| {
            tracing::warn!(integration = kind, "Health check already active, integration not changed");
        })
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("identity", &self.shared.identity)
            .field("upstream", &self.shared.upstream)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HealthCheckConfig;
    use crate::error::ErrorCategory;
    use axum::{routing::get, Router};
    use std::net::Ipv4Addr;
    use tokio::sync::Notify;

    fn config() -> RegistrationConfig {
        RegistrationConfig {
            name: "orders".into(),
            host: "10.0.0.5".into(),
            port: 9000,
            ..RegistrationConfig::default()
        }
    }

    #[test]
    fn test_construction_validates() {
        let err = Registration::new(RegistrationConfig::default()).unwrap_err();
        assert_eq!(err, ConfigError::MissingName);

        let err = Registration::new(RegistrationConfig {
            admin_api: "/apisix/admin".into(),
            ..config()
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidAdminApi { .. }));
    }

    #[tokio::test]
    async fn test_derived_identity() {
        let registration = Registration::new(config()).unwrap();
        assert_eq!(registration.node_key(), "10.0.0.5:9000");
        assert_eq!(registration.upstream().id, "orders_10.0.0.5_9000");
        assert_eq!(registration.state().await, RegistrationState::Unregistered);
        assert_eq!(registration.health_integration().await, "self-hosted");
    }

    #[tokio::test]
    async fn test_network_calls_need_admin_api() {
        let registration = Registration::new(config()).unwrap();

        let err = registration.register().await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::InvalidConfig);
        let err = registration.deregister().await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::InvalidConfig);
        assert_eq!(registration.state().await, RegistrationState::Unregistered);
    }

    #[tokio::test]
    async fn test_health_disabled_is_noop() {
        let registration = Registration::new(config()).unwrap();
        registration.start_health_check().await.unwrap();
        registration.shutdown(Duration::from_secs(1)).await.unwrap();
        assert!(registration.health_addr().await.is_none());
    }

    #[tokio::test]
    async fn test_router_adapter_takes_priority() {
        let registration = Registration::builder(config())
            .with_http_server(SharedServer::without_handler())
            .with_router_adapter(RouterAdapter::new(|_, _| Ok(())))
            .build()
            .unwrap();
        assert_eq!(registration.health_integration().await, "router");

        let registration = Registration::builder(config())
            .with_http_server(SharedServer::without_handler())
            .build()
            .unwrap();
        assert_eq!(registration.health_integration().await, "server");
    }

    #[tokio::test]
    async fn test_late_integration_refused_once_active() {
        let registration = Registration::new(RegistrationConfig {
            health_check: HealthCheckConfig {
                enabled: true,
                path: "/health".into(),
            },
            ..config()
        })
        .unwrap();

        registration
            .set_router_adapter(RouterAdapter::new(|_, _| Ok(())))
            .await
            .unwrap();
        registration.start_health_check().await.unwrap();

        let err = registration
            .set_http_server(SharedServer::without_handler())
            .await
            .unwrap_err();
        assert!(matches!(err, HealthError::AlreadyActive));
        assert_eq!(registration.health_integration().await, "router");
    }

    #[tokio::test]
    async fn test_stop_without_start_resolves() {
        let registration = Registration::new(config()).unwrap();
        let context = registration.context();

        registration.stop().await;
        tokio::time::timeout(Duration::from_secs(1), registration.stopped())
            .await
            .unwrap();
        assert!(context.is_cancelled());
    }

    #[tokio::test]
    async fn test_shutdown_timeout_is_reported() {
        let entered = Arc::new(Notify::new());
        let signal = entered.clone();
        let stuck = Router::new().route(
            "/stuck",
            get(move || {
                let signal = signal.clone();
                async move {
                    signal.notify_one();
                    std::future::pending::<()>().await
                }
            }),
        );

        let registration = Registration::new(RegistrationConfig {
            health_check: HealthCheckConfig {
                enabled: true,
                path: "/health".into(),
            },
            ..config()
        })
        .unwrap();
        let listener = SelfHosted::with_addr(SocketAddr::from((Ipv4Addr::LOCALHOST, 0))).with_routes(stuck);
        registration
            .set_integration(HealthIntegration::SelfHosted(listener))
            .await
            .unwrap();
        registration.start_health_check().await.unwrap();

        let addr = registration.health_addr().await.unwrap();
        tokio::spawn(async move {
            let _ = reqwest::get(format!("http://{}/stuck", addr)).await;
        });
        entered.notified().await;

        let err = registration
            .shutdown(Duration::from_millis(100))
            .await
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::ShutdownFailed);
        assert!(matches!(err, Error::Shutdown(HealthError::ShutdownTimeout(_))));
        assert!(registration.health_addr().await.is_none());
    }
}
