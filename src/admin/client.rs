//! Gateway admin API client with timeout and retry handling.
//!
//! # Responsibilities
//! - Issue upstream and route calls against the admin base address
//! - Attach the `X-API-KEY` header when a key is configured
//! - Retry transient failures per [`RetryPolicy`]
//! - Map every non-success status to [`AdminError::Status`]
//!
//! The client knows nothing about service lifecycle.

use std::fmt;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};

use crate::admin::types::{
    AdminError, AdminResult, NodesPatch, RouteDocument, UpstreamDocument,
};
use crate::config::AdminClientConfig;
use crate::resilience::retries::{is_retryable_status, RetryPolicy};

/// Header carrying the admin API key.
pub const API_KEY_HEADER: &str = "X-API-KEY";

/// A fully read admin API response.
#[derive(Debug)]
struct AdminResponse {
    status: StatusCode,
    body: String,
}

/// Stateless client for the gateway admin API.
#[derive(Clone)]
pub struct AdminClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    retry: RetryPolicy,
}

impl AdminClient {
    /// Create a client for `base_url` (e.g. `http://apisix:9180/apisix/admin`).
    ///
    /// No request is sent here.
    pub fn new(base_url: &str, api_key: &str, config: &AdminClientConfig) -> AdminResult<Self> {
        let trimmed = base_url.trim_end_matches('/');
        url::Url::parse(trimmed).map_err(|source| AdminError::InvalidBaseUrl {
            address: base_url.to_string(),
            source,
        })?;

        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(AdminError::Build)?;

        Ok(Self {
            http,
            base_url: trimmed.to_string(),
            api_key: (!api_key.is_empty()).then(|| api_key.to_string()),
            retry: RetryPolicy::from_config(config),
        })
    }

    /// Base address without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// True if requests carry an API key.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn upstream_url(&self, upstream_id: &str) -> String {
        format!("{}/upstreams/{}", self.base_url, upstream_id)
    }

    fn route_url(&self, route_id: &str) -> String {
        format!("{}/routes/{}", self.base_url, route_id)
    }

    /// Check whether an upstream exists: 200 → true, 404 → false.
    pub async fn upstream_exists(&self, upstream_id: &str) -> AdminResult<bool> {
        const OP: &str = "check upstream";
        let url = self.upstream_url(upstream_id);
        let response = self.execute(OP, upstream_id, || self.http.get(&url)).await?;

        match response.status {
            StatusCode::OK => {
                tracing::debug!(upstream_id, "Upstream exists");
                Ok(true)
            }
            StatusCode::NOT_FOUND => Ok(false),
            _ => Err(status_error(OP, upstream_id, response)),
        }
    }

    /// Fetch an upstream document, `None` if it does not exist.
    pub async fn get_upstream(&self, upstream_id: &str) -> AdminResult<Option<UpstreamDocument>> {
        const OP: &str = "get upstream";
        let url = self.upstream_url(upstream_id);
        let response = self.execute(OP, upstream_id, || self.http.get(&url)).await?;

        match response.status {
            StatusCode::OK => UpstreamDocument::from_admin_body(&response.body)
                .map(Some)
                .map_err(|source| AdminError::Decode {
                    op: OP,
                    id: upstream_id.to_string(),
                    source,
                }),
            StatusCode::NOT_FOUND => Ok(None),
            _ => Err(status_error(OP, upstream_id, response)),
        }
    }

    /// Create or replace an upstream with the full document.
    pub async fn put_upstream(
        &self,
        upstream_id: &str,
        document: &UpstreamDocument,
    ) -> AdminResult<()> {
        const OP: &str = "put upstream";
        let url = self.upstream_url(upstream_id);
        let response = self
            .execute(OP, upstream_id, || self.http.put(&url).json(document))
            .await?;
        expect_status(OP, upstream_id, response, &[StatusCode::OK, StatusCode::CREATED])
    }

    /// Merge-patch the `nodes` field of an existing upstream.
    pub async fn patch_upstream_nodes(
        &self,
        upstream_id: &str,
        patch: &NodesPatch,
    ) -> AdminResult<()> {
        const OP: &str = "patch upstream nodes";
        let url = self.upstream_url(upstream_id);
        let response = self
            .execute(OP, upstream_id, || self.http.patch(&url).json(patch))
            .await?;
        expect_status(OP, upstream_id, response, &[StatusCode::OK, StatusCode::CREATED])
    }

    /// Delete an upstream. Never called by the registration lifecycle.
    pub async fn delete_upstream(&self, upstream_id: &str) -> AdminResult<()> {
        const OP: &str = "delete upstream";
        let url = self.upstream_url(upstream_id);
        let response = self.execute(OP, upstream_id, || self.http.delete(&url)).await?;
        expect_status(OP, upstream_id, response, &[StatusCode::OK, StatusCode::NO_CONTENT])?;

        tracing::info!(upstream_id, "Upstream deleted");
        Ok(())
    }

    /// Create or replace a route forwarding `uri` to `upstream_id`.
    pub async fn create_route(
        &self,
        route_id: &str,
        name: &str,
        uri: &str,
        upstream_id: &str,
    ) -> AdminResult<()> {
        const OP: &str = "create route";
        let url = self.route_url(route_id);
        let document = RouteDocument {
            name: name.to_string(),
            uri: uri.to_string(),
            upstream_id: upstream_id.to_string(),
        };
        let response = self
            .execute(OP, route_id, || self.http.put(&url).json(&document))
            .await?;
        expect_status(OP, route_id, response, &[StatusCode::OK, StatusCode::CREATED])?;

        tracing::info!(route_id, name, uri, upstream_id, "Route created");
        Ok(())
    }

    /// Delete a route.
    pub async fn delete_route(&self, route_id: &str) -> AdminResult<()> {
        const OP: &str = "delete route";
        let url = self.route_url(route_id);
        let response = self.execute(OP, route_id, || self.http.delete(&url)).await?;
        expect_status(OP, route_id, response, &[StatusCode::OK, StatusCode::NO_CONTENT])?;

        tracing::info!(route_id, "Route deleted");
        Ok(())
    }

    /// Send a request, retrying network errors and retryable statuses.
    async fn execute<F>(&self, op: &'static str, id: &str, build: F) -> AdminResult<AdminResponse>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;

            let mut request = build();
            if let Some(key) = &self.api_key {
                request = request.header(API_KEY_HEADER, key);
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if is_retryable_status(status) && self.retry.should_retry(attempt) {
                        let delay = self.retry.backoff(attempt);
                        tracing::warn!(op, id, attempt, status = %status, delay = ?delay, "Retrying admin API call");
                        tokio::time::sleep(delay).await;
                        continue;
                    }

                    let body = response.text().await.map_err(|source| AdminError::Request {
                        op,
                        id: id.to_string(),
                        source,
                    })?;
                    return Ok(AdminResponse { status, body });
                }
                Err(source) => {
                    if self.retry.should_retry(attempt) {
                        let delay = self.retry.backoff(attempt);
                        tracing::warn!(op, id, attempt, error = %source, delay = ?delay, "Admin API unreachable, retrying");
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(AdminError::Request {
                        op,
                        id: id.to_string(),
                        source,
                    });
                }
            }
        }
    }
}

impl fmt::Debug for AdminClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminClient")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("retry", &self.retry)
            .finish()
    }
}

fn status_error(op: &'static str, id: &str, response: AdminResponse) -> AdminError {
    AdminError::Status {
        op,
        id: id.to_string(),
        status: response.status.as_u16(),
        body: response.body,
    }
}

fn expect_status(
    op: &'static str,
    id: &str,
    response: AdminResponse,
    accepted: &[StatusCode],
) -> AdminResult<()> {
    if accepted.contains(&response.status) {
        Ok(())
    } else {
        Err(status_error(op, id, response))
    }
}
