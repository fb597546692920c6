//! Health endpoint response.

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, MethodRouter},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Body served by every health integration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Always `"ok"`.
    pub status: String,
    pub service: String,
    /// RFC 3339 timestamp of the response.
    pub time: String,
}

/// Serves the health response for one service.
///
/// Cheap to clone; hand it to whatever router should expose the route.
#[derive(Debug, Clone)]
pub struct HealthHandler {
    service: Arc<str>,
}

impl HealthHandler {
    pub fn new(service: &str) -> Self {
        Self {
            service: Arc::from(service),
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn status(&self) -> HealthStatus {
        HealthStatus {
            status: "ok".to_string(),
            service: self.service.to_string(),
            time: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }

    /// `200 OK` with a JSON [`HealthStatus`] body.
    pub fn respond(&self) -> Response {
        (StatusCode::OK, Json(self.status())).into_response()
    }

    /// GET route for axum routers.
    pub fn method_router<S>(&self) -> MethodRouter<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let handler = self.clone();
        get(move || async move { handler.respond() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header;

    #[tokio::test]
    async fn test_health_response() {
        let response = HealthHandler::new("orders").respond();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let status: HealthStatus = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(status.status, "ok");
        assert_eq!(status.service, "orders");
        assert!(chrono::DateTime::parse_from_rfc3339(&status.time).is_ok());
    }
}
