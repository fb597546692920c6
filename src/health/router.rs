//! Adapter for arbitrary third-party routers.

use std::fmt;
use std::sync::Arc;

use crate::health::error::{BoxError, HealthError};
use crate::health::handler::HealthHandler;

type RegisterRouteFn = dyn Fn(&str, HealthHandler) -> Result<(), BoxError> + Send + Sync;

/// Mounts the health route through a caller-supplied callback.
///
/// The callback is invoked once per mount and owns everything about the
/// router it writes to, including its shutdown.
#[derive(Clone)]
pub struct RouterAdapter {
    register: Arc<RegisterRouteFn>,
}

impl RouterAdapter {
    pub fn new<F>(register: F) -> Self
    where
        F: Fn(&str, HealthHandler) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        Self {
            register: Arc::new(register),
        }
    }

    pub fn mount(&self, path: &str, handler: HealthHandler) -> Result<(), HealthError> {
        (self.register)(path, handler).map_err(HealthError::Register)
    }
}

impl fmt::Debug for RouterAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterAdapter").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_callback_receives_path() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let adapter = RouterAdapter::new(move |path, handler| {
            sink.lock().unwrap().push((path.to_string(), handler.service().to_string()));
            Ok(())
        });

        adapter.mount("/healthz", HealthHandler::new("orders")).unwrap();
        assert_eq!(
            *seen.lock().unwrap(),
            vec![("/healthz".to_string(), "orders".to_string())]
        );
    }

    #[test]
    fn test_callback_error_wrapped() {
        let adapter = RouterAdapter::new(|path, _| Err(format!("route {} conflicts", path).into()));
        let err = adapter.mount("/health", HealthHandler::new("orders")).unwrap_err();
        assert!(matches!(err, HealthError::Register(_)));
        assert_eq!(err.to_string(), "route registration failed: route /health conflicts");
    }
}
