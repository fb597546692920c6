//! Dedicated health listener.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use crate::health::error::HealthError;
use crate::health::handler::HealthHandler;

struct RunningServer {
    token: CancellationToken,
    task: JoinHandle<std::io::Result<()>>,
    local_addr: SocketAddr,
}

/// Serves the health route on its own listener, all interfaces by default.
pub struct SelfHosted {
    addr: SocketAddr,
    base: Router,
    running: Option<RunningServer>,
}

impl SelfHosted {
    /// Listener on `0.0.0.0:port`.
    pub fn new(port: u16) -> Self {
        Self::with_addr(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)))
    }

    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            addr,
            base: Router::new(),
            running: None,
        }
    }

    /// Serve `routes` next to the health route.
    #[cfg(test)]
    pub(crate) fn with_routes(mut self, routes: Router) -> Self {
        self.base = routes;
        self
    }

    /// Address actually bound, once started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running.as_ref().map(|running| running.local_addr)
    }

    /// Bind and start serving in the background.
    ///
    /// Binding happens before this returns, so an occupied port is reported
    /// here rather than lost in the background task.
    pub async fn start(&mut self, path: &str, handler: HealthHandler) -> Result<SocketAddr, HealthError> {
        if self.running.is_some() {
            return Err(HealthError::AlreadyActive);
        }

        let listener = TcpListener::bind(self.addr)
            .await
            .map_err(|source| HealthError::Bind {
                addr: self.addr,
                source,
            })?;
        let local_addr = listener.local_addr().map_err(|source| HealthError::Bind {
            addr: self.addr,
            source,
        })?;

        let app = self
            .base
            .clone()
            .route(path, handler.method_router())
            .layer(TraceLayer::new_for_http());

        let token = CancellationToken::new();
        let shutdown = token.clone();
        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { shutdown.cancelled().await })
                .await
        });

        tracing::info!(address = %local_addr, path, "Health listener started");
        self.running = Some(RunningServer {
            token,
            task,
            local_addr,
        });
        Ok(local_addr)
    }

    /// Stop the listener, waiting up to `timeout` for in-flight requests.
    ///
    /// The task is aborted if it overruns. No-op if never started.
    pub async fn shutdown(&mut self, timeout: Duration) -> Result<(), HealthError> {
        let Some(mut running) = self.running.take() else {
            return Ok(());
        };

        running.token.cancel();
        match tokio::time::timeout(timeout, &mut running.task).await {
            Ok(joined) => {
                joined?.map_err(HealthError::Serve)?;
                tracing::info!(address = %running.local_addr, "Health listener stopped");
                Ok(())
            }
            Err(_) => {
                running.task.abort();
                tracing::warn!(address = %running.local_addr, ?timeout, "Health listener shutdown timed out");
                Err(HealthError::ShutdownTimeout(timeout))
            }
        }
    }
}

impl std::fmt::Debug for SelfHosted {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelfHosted")
            .field("addr", &self.addr)
            .field("local_addr", &self.local_addr())
            .finish()
    }
}
