//! Three-step route resolution against the key-value store.
//!
//! 1. target: `route:{c}:{w}` (when a warehouse is given), then `route:{c}`
//! 2. endpoint: `endpoint:{target}`
//! 3. path: `path:{target}:{sourcePath}`, falling back to the source path
//!
//! Each step runs only when the previous one succeeded.

use tracing::Instrument;

use super::keys::{endpoint_key, path_key, RoutingKey};
use crate::error::RouteError;
use crate::store::KvStore;

/// Where a request should be forwarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoute {
    pub target_key: String,
    pub endpoint: String,
    pub destination_path: String,
}

pub async fn resolve(
    store: &dyn KvStore,
    key: &RoutingKey,
    source_path: &str,
) -> Result<ResolvedRoute, RouteError> {
    let span = kv_router_tracing::resolve_span!(&key.customer_id);

    async {
        let target_key = resolve_target(store, key).await?;
        tracing::Span::current().record("target_key", target_key.as_str());

        let endpoint = store
            .get(&endpoint_key(&target_key))
            .await?
            .ok_or_else(|| RouteError::EndpointNotFound {
                target_key: target_key.clone(),
            })?;
        tracing::Span::current().record("endpoint", endpoint.as_str());

        let destination_path = match store.get(&path_key(&target_key, source_path)).await? {
            Some(mapped) => {
                tracing::debug!(source_path, mapped = %mapped, "Path mapping applied");
                mapped
            }
            None => source_path.to_string(),
        };
        tracing::Span::current().record("destination_path", destination_path.as_str());

        Ok(ResolvedRoute {
            target_key,
            endpoint,
            destination_path,
        })
    }
    .instrument(span)
    .await
}

/// Warehouse-specific mapping wins; the customer-level mapping is consulted
/// only when there is no warehouse id or its lookup came back empty.
async fn resolve_target(store: &dyn KvStore, key: &RoutingKey) -> Result<String, RouteError> {
    if let Some(warehouse_key) = key.warehouse_key() {
        if let Some(target) = store.get(&warehouse_key).await? {
            return Ok(target);
        }
        tracing::debug!(key = %warehouse_key, "No warehouse-specific route, trying customer-level");
    }

    store
        .get(&key.customer_key())
        .await?
        .ok_or_else(|| RouteError::RoutingNotFound {
            customer_id: key.customer_id.clone(),
            warehouse_id: key.warehouse_id.clone(),
        })
}
