//! Converges the gateway's node set with this instance's presence.

use std::time::Duration;

use crate::admin::{AdminClient, AdminResult, UpstreamDocument};
use crate::resilience::backoff::random_delay;
use crate::upstream::identity::UpstreamRef;

/// What `create_or_join` did to the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// Upstream did not exist and was created holding only this node.
    Created,
    /// Node was added to an existing upstream.
    Joined,
    /// Node was already present; nothing was written.
    AlreadyPresent,
}

/// What `remove_node` did to the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    /// Node was not in the upstream; nothing was written.
    NodeAbsent,
    /// Upstream does not exist; nothing was written.
    UpstreamAbsent,
}

/// Adds and removes a single node in a gateway upstream.
#[derive(Debug, Clone)]
pub struct Reconciler {
    client: AdminClient,
    join_jitter: Duration,
}

impl Reconciler {
    pub fn new(client: AdminClient, join_jitter: Duration) -> Self {
        Self {
            client,
            join_jitter,
        }
    }

    pub fn client(&self) -> &AdminClient {
        &self.client
    }

    /// Make sure `node_key` is part of `upstream`, creating the upstream if needed.
    ///
    /// Idempotent: joining twice leaves a single entry. An existing upstream is
    /// never replaced wholesale; its document is fetched, extended and written
    /// back in full because PUT replaces rather than merges.
    pub async fn create_or_join(
        &self,
        upstream: &UpstreamRef,
        name: &str,
        node_key: &str,
    ) -> AdminResult<JoinOutcome> {
        if self.client.upstream_exists(&upstream.id).await? {
            tracing::info!(upstream_id = %upstream.id, node = node_key, "Upstream exists, joining");

            if !self.join_jitter.is_zero() {
                tokio::time::sleep(random_delay(self.join_jitter)).await;
            }

            if let Some(mut document) = self.client.get_upstream(&upstream.id).await? {
                if !document.add_node(node_key) {
                    tracing::info!(upstream_id = %upstream.id, node = node_key, "Node already registered");
                    return Ok(JoinOutcome::AlreadyPresent);
                }

                self.client.put_upstream(&upstream.id, &document).await?;
                tracing::info!(
                    upstream_id = %upstream.id,
                    node = node_key,
                    nodes = document.nodes.len(),
                    "Node added to upstream"
                );
                return Ok(JoinOutcome::Joined);
            }

            tracing::warn!(upstream_id = %upstream.id, "Upstream vanished before join, recreating");
        }

        let document = UpstreamDocument::new(name, &upstream.lb_type, node_key);
        self.client.put_upstream(&upstream.id, &document).await?;
        tracing::info!(
            upstream_id = %upstream.id,
            name,
            lb_type = %upstream.lb_type,
            node = node_key,
            "Upstream created"
        );
        Ok(JoinOutcome::Created)
    }

    /// Remove `node_key` from `upstream_id`.
    ///
    /// A missing upstream or node is success. The upstream itself is never
    /// deleted, even when the last node goes.
    pub async fn remove_node(&self, upstream_id: &str, node_key: &str) -> AdminResult<RemoveOutcome> {
        let Some(document) = self.client.get_upstream(upstream_id).await? else {
            tracing::info!(upstream_id, "Upstream does not exist, nothing to remove");
            return Ok(RemoveOutcome::UpstreamAbsent);
        };

        let Some(patch) = document.removal_patch(node_key) else {
            tracing::info!(upstream_id, node = node_key, "Node not registered, nothing to remove");
            return Ok(RemoveOutcome::NodeAbsent);
        };

        self.client.patch_upstream_nodes(upstream_id, &patch).await?;
        tracing::info!(upstream_id, node = node_key, "Node removed from upstream");
        Ok(RemoveOutcome::Removed)
    }
}
