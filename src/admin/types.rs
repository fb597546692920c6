//! Admin API documents and error definitions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::schema::DEFAULT_UPSTREAM_TYPE;

/// Weight given to a node this instance adds.
pub const DEFAULT_NODE_WEIGHT: u32 = 1;

/// Errors talking to the gateway admin API.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Base address is not an absolute URL.
    #[error("invalid admin API address '{address}': {source}")]
    InvalidBaseUrl {
        address: String,
        #[source]
        source: url::ParseError,
    },

    /// HTTP client could not be constructed.
    #[error("failed to build admin API client: {0}")]
    Build(#[source] reqwest::Error),

    /// Network failure or timeout, after retries.
    #[error("{op} '{id}': request failed: {source}")]
    Request {
        op: &'static str,
        id: String,
        #[source]
        source: reqwest::Error,
    },

    /// Gateway answered with an unexpected status.
    #[error("{op} '{id}': unexpected status {status}, response: {body}")]
    Status {
        op: &'static str,
        id: String,
        status: u16,
        body: String,
    },

    /// Gateway answered 200 with a body we cannot read.
    #[error("{op} '{id}': malformed response: {source}")]
    Decode {
        op: &'static str,
        id: String,
        #[source]
        source: serde_json::Error,
    },
}

impl AdminError {
    /// HTTP status carried by the error, if the gateway answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            AdminError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type for admin API operations.
pub type AdminResult<T> = Result<T, AdminError>;

/// Upstream document as stored by the gateway.
///
/// Fields this crate does not manage are kept in `extra` so a full-document
/// PUT writes them back untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpstreamDocument {
    #[serde(default)]
    pub name: String,

    #[serde(rename = "type", default = "default_lb_type")]
    pub lb_type: String,

    #[serde(default)]
    pub nodes: BTreeMap<String, u32>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_lb_type() -> String {
    DEFAULT_UPSTREAM_TYPE.to_string()
}

impl UpstreamDocument {
    /// A fresh upstream holding a single node.
    pub fn new(name: &str, lb_type: &str, node_key: &str) -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(node_key.to_string(), DEFAULT_NODE_WEIGHT);
        Self {
            name: name.to_string(),
            lb_type: lb_type.to_string(),
            nodes,
            extra: Map::new(),
        }
    }

    /// Parse a GET response body.
    ///
    /// The gateway wraps documents as `{"key": .., "value": {..}}`; a bare
    /// document is accepted as well.
    pub fn from_admin_body(body: &str) -> Result<Self, serde_json::Error> {
        let mut value: Value = serde_json::from_str(body)?;
        if let Some(inner) = value.get_mut("value") {
            value = inner.take();
        }
        serde_json::from_value(value)
    }

    pub fn contains_node(&self, node_key: &str) -> bool {
        self.nodes.contains_key(node_key)
    }

    /// Add a node with the default weight. Returns false if it was already there.
    pub fn add_node(&mut self, node_key: &str) -> bool {
        if self.contains_node(node_key) {
            return false;
        }
        self.nodes
            .insert(node_key.to_string(), DEFAULT_NODE_WEIGHT);
        true
    }

    /// Merge patch deleting `node_key`, or `None` if the node is not present.
    ///
    /// Only `node_key` appears in the patch; other nodes are whatever the
    /// gateway holds when the patch lands, not this snapshot.
    pub fn removal_patch(&self, node_key: &str) -> Option<NodesPatch> {
        self.contains_node(node_key)
            .then(|| NodesPatch::remove(node_key))
    }
}

/// PATCH body touching only the `nodes` field; `null` deletes a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodesPatch {
    pub nodes: BTreeMap<String, Option<u32>>,
}

impl NodesPatch {
    /// `{"nodes": {"<node_key>": null}}`
    pub fn remove(node_key: &str) -> Self {
        Self {
            nodes: BTreeMap::from([(node_key.to_string(), None)]),
        }
    }
}

/// Route document bound to an upstream id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDocument {
    pub name: String,
    pub uri: String,
    pub upstream_id: String,
}
