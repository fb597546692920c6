//! Shared utilities for integration tests.
//!
//! `FakeGateway` is an in-process stand-in for the gateway admin API:
//! upstream and route documents kept in memory, GET responses wrapped in
//! `{"key", "value"}`, PATCH applied as a JSON merge patch.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use serde_json::{json, Map, Value};
use tokio::net::TcpListener;

use upstream_registrar::config::{AdminClientConfig, RegistrationConfig};

#[derive(Default)]
struct GatewayState {
    upstreams: HashMap<String, Value>,
    routes: HashMap<String, Value>,
    requests: Vec<Method>,
    reject_routes: bool,
    /// Node dropped from an upstream right after the next GET of it.
    leave_after_get: Option<(String, String)>,
}

#[derive(Clone)]
pub struct FakeGateway {
    state: Arc<Mutex<GatewayState>>,
    api_key: Option<String>,
    addr: SocketAddr,
}

impl FakeGateway {
    pub async fn start() -> Self {
        Self::start_with_key(None).await
    }

    /// Gateway rejecting requests whose `X-API-KEY` differs from `key`.
    pub async fn start_with_key(key: Option<&str>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let gateway = Self {
            state: Arc::default(),
            api_key: key.map(str::to_string),
            addr: listener.local_addr().unwrap(),
        };

        let app = Router::new()
            .route(
                "/apisix/admin/upstreams/{id}",
                get(get_upstream)
                    .put(put_upstream)
                    .patch(patch_upstream)
                    .delete(delete_upstream),
            )
            .route("/apisix/admin/routes/{id}", put(put_route).delete(delete_route))
            .with_state(gateway.clone());

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        gateway
    }

    pub fn admin_url(&self) -> String {
        format!("http://{}/apisix/admin", self.addr)
    }

    pub fn upstream(&self, id: &str) -> Option<Value> {
        self.state.lock().unwrap().upstreams.get(id).cloned()
    }

    /// Node weights of an upstream, `None` if the upstream does not exist.
    pub fn nodes(&self, id: &str) -> Option<BTreeMap<String, u64>> {
        let upstream = self.upstream(id)?;
        let nodes = upstream
            .get("nodes")
            .and_then(Value::as_object)
            .map(|nodes| {
                nodes
                    .iter()
                    .map(|(key, weight)| (key.clone(), weight.as_u64().unwrap()))
                    .collect()
            })
            .unwrap_or_default();
        Some(nodes)
    }

    pub fn route(&self, id: &str) -> Option<Value> {
        self.state.lock().unwrap().routes.get(id).cloned()
    }

    pub fn insert_upstream(&self, id: &str, document: Value) {
        self.state
            .lock()
            .unwrap()
            .upstreams
            .insert(id.to_string(), document);
    }

    /// Answer route writes with 400 from now on.
    pub fn reject_route_writes(&self) {
        self.state.lock().unwrap().reject_routes = true;
    }

    /// Remove `node` from upstream `id` just after the next GET of `id` is
    /// answered, as if another instance deregistered concurrently.
    pub fn leave_after_next_get(&self, id: &str, node: &str) {
        self.state.lock().unwrap().leave_after_get = Some((id.to_string(), node.to_string()));
    }

    /// Number of accepted requests with `method`.
    pub fn count(&self, method: Method) -> usize {
        self.state
            .lock()
            .unwrap()
            .requests
            .iter()
            .filter(|m| **m == method)
            .count()
    }

    fn authorize(&self, headers: &HeaderMap, method: Method) -> Result<(), Response> {
        if let Some(expected) = &self.api_key {
            let provided = headers.get("x-api-key").and_then(|v| v.to_str().ok());
            if provided != Some(expected.as_str()) {
                let body = Json(json!({"message": "failed to check token"}));
                return Err((StatusCode::UNAUTHORIZED, body).into_response());
            }
        }
        self.state.lock().unwrap().requests.push(method);
        Ok(())
    }
}

fn envelope(kind: &str, id: &str, value: Value) -> Json<Value> {
    Json(json!({"key": format!("/apisix/{}/{}", kind, id), "value": value}))
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({"message": "Key not found"}))).into_response()
}

/// RFC 7386 merge: `null` deletes, objects merge recursively, anything else replaces.
fn merge_patch(target: &mut Value, patch: &Value) {
    let Value::Object(patch) = patch else {
        *target = patch.clone();
        return;
    };
    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    if let Value::Object(target) = target {
        for (key, value) in patch {
            if value.is_null() {
                target.remove(key);
            } else {
                merge_patch(target.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
    }
}

async fn get_upstream(
    State(gateway): State<FakeGateway>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Err(denied) = gateway.authorize(&headers, Method::GET) {
        return denied;
    }
    let mut state = gateway.state.lock().unwrap();
    let Some(document) = state.upstreams.get(&id).cloned() else {
        return not_found();
    };
    if state.leave_after_get.as_ref().is_some_and(|(upstream, _)| *upstream == id) {
        if let Some((_, node)) = state.leave_after_get.take() {
            let nodes = state
                .upstreams
                .get_mut(&id)
                .and_then(|document| document.get_mut("nodes"))
                .and_then(Value::as_object_mut);
            if let Some(nodes) = nodes {
                nodes.remove(&node);
            }
        }
    }
    envelope("upstreams", &id, document).into_response()
}

async fn put_upstream(
    State(gateway): State<FakeGateway>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(document): Json<Value>,
) -> Response {
    if let Err(denied) = gateway.authorize(&headers, Method::PUT) {
        return denied;
    }
    let previous = gateway
        .state
        .lock()
        .unwrap()
        .upstreams
        .insert(id.clone(), document.clone());
    let status = if previous.is_some() { StatusCode::OK } else { StatusCode::CREATED };
    (status, envelope("upstreams", &id, document)).into_response()
}

async fn patch_upstream(
    State(gateway): State<FakeGateway>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(patch): Json<Value>,
) -> Response {
    if let Err(denied) = gateway.authorize(&headers, Method::PATCH) {
        return denied;
    }
    let mut state = gateway.state.lock().unwrap();
    let Some(document) = state.upstreams.get_mut(&id) else {
        return not_found();
    };
    merge_patch(document, &patch);
    envelope("upstreams", &id, document.clone()).into_response()
}

async fn delete_upstream(
    State(gateway): State<FakeGateway>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Err(denied) = gateway.authorize(&headers, Method::DELETE) {
        return denied;
    }
    match gateway.state.lock().unwrap().upstreams.remove(&id) {
        Some(_) => Json(json!({"deleted": "1", "key": format!("/apisix/upstreams/{}", id)})).into_response(),
        None => not_found(),
    }
}

async fn put_route(
    State(gateway): State<FakeGateway>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(document): Json<Value>,
) -> Response {
    if let Err(denied) = gateway.authorize(&headers, Method::PUT) {
        return denied;
    }
    let mut state = gateway.state.lock().unwrap();
    if state.reject_routes {
        let body = Json(json!({"error_msg": "invalid configuration: property \"uri\" validation failed"}));
        return (StatusCode::BAD_REQUEST, body).into_response();
    }
    state.routes.insert(id.clone(), document.clone());
    (StatusCode::CREATED, envelope("routes", &id, document)).into_response()
}

async fn delete_route(
    State(gateway): State<FakeGateway>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Err(denied) = gateway.authorize(&headers, Method::DELETE) {
        return denied;
    }
    match gateway.state.lock().unwrap().routes.remove(&id) {
        Some(_) => Json(json!({"deleted": "1", "key": format!("/apisix/routes/{}", id)})).into_response(),
        None => not_found(),
    }
}

/// Registration config pointing at `gateway`, with fast retries.
pub fn config_for(gateway: &FakeGateway, name: &str, host: &str, port: u16) -> RegistrationConfig {
    RegistrationConfig {
        name: name.to_string(),
        host: host.to_string(),
        port,
        admin_api: gateway.admin_url(),
        api_key: "test-key".to_string(),
        client: AdminClientConfig {
            timeout_ms: 1000,
            retry_wait_ms: 10,
            retry_max_wait_ms: 20,
            ..AdminClientConfig::default()
        },
        ..RegistrationConfig::default()
    }
}

/// A port that was free a moment ago.
pub fn free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

/// Wait for `condition`, polling every 10ms for up to 2s.
pub async fn eventually<F: Fn() -> bool>(condition: F) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}
