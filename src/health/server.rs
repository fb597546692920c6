//! Adapter for an externally owned axum server.
//!
//! The caller serves [`SharedServer::service`]; its root router lives behind
//! an `ArcSwapOption` so the health route can be wrapped around it while the
//! server is already accepting connections.

use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use axum::{
    extract::Request,
    http::{Method, StatusCode},
    response::IntoResponse,
    Router,
};
use tower::{service_fn, ServiceExt};

use crate::health::error::HealthError;
use crate::health::handler::HealthHandler;

/// Swappable root handler of a server the caller runs.
#[derive(Clone, Default)]
pub struct SharedServer {
    root: Arc<ArcSwapOption<Router>>,
}

impl SharedServer {
    pub fn new(root: Router) -> Self {
        Self {
            root: Arc::new(ArcSwapOption::from_pointee(root)),
        }
    }

    /// A server with no root handler yet. Mounting onto it fails.
    pub fn without_handler() -> Self {
        Self::default()
    }

    pub fn has_handler(&self) -> bool {
        self.root.load().is_some()
    }

    /// Current root handler.
    pub fn root(&self) -> Option<Router> {
        self.root.load_full().map(|router| Router::clone(&router))
    }

    pub fn set_root(&self, root: Router) {
        self.root.store(Some(Arc::new(root)));
    }

    /// Router to hand to `axum::serve`. Every request is dispatched to the
    /// root installed at the time it arrives; `503` while there is none.
    pub fn service(&self) -> Router {
        let root = self.root.clone();
        Router::new().fallback_service(service_fn(move |request: Request| {
            let current = root.load_full();
            async move {
                match current {
                    Some(router) => Router::clone(&router).oneshot(request).await,
                    None => Ok(StatusCode::SERVICE_UNAVAILABLE.into_response()),
                }
            }
        }))
    }
}

impl fmt::Debug for SharedServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedServer")
            .field("has_handler", &self.has_handler())
            .finish()
    }
}

/// Wraps the health route around a [`SharedServer`]'s current root.
#[derive(Debug, Clone)]
pub struct ServerAdapter {
    server: SharedServer,
    /// Root seen at the first mount; later mounts wrap this again instead of
    /// stacking dispatchers.
    base: Option<Router>,
}

impl ServerAdapter {
    pub fn new(server: SharedServer) -> Self {
        Self { server, base: None }
    }

    pub fn server(&self) -> &SharedServer {
        &self.server
    }

    /// `GET` on exactly `path` is answered by `handler`; everything else goes
    /// to the handler that was installed before.
    pub fn mount(&mut self, path: &str, handler: HealthHandler) -> Result<(), HealthError> {
        let base = match self.base.take() {
            Some(base) => base,
            None => self.server.root().ok_or(HealthError::MissingHandler)?,
        };
        self.server
            .set_root(dispatcher(base.clone(), path.to_string(), handler));
        self.base = Some(base);
        Ok(())
    }
}

fn dispatcher(prior: Router, path: String, handler: HealthHandler) -> Router {
    Router::new().fallback_service(service_fn(move |request: Request| {
        let is_health = request.method() == Method::GET && request.uri().path() == path;
        let prior = prior.clone();
        let handler = handler.clone();
        async move {
            if is_health {
                Ok::<_, Infallible>(handler.respond())
            } else {
                prior.oneshot(request).await
            }
        }
    }))
}
