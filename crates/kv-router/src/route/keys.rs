//! Key layout in the route store.
//!
//! Three colon-joined namespaces:
//! - `route:{customerId}:{warehouseId}` / `route:{customerId}` -> target key
//! - `endpoint:{targetKey}` -> backend base URL
//! - `path:{targetKey}:{sourcePath}` -> destination path

/// Business identifiers a request is routed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingKey {
    pub customer_id: String,
    pub warehouse_id: Option<String>,
}

impl RoutingKey {
    /// An empty warehouse id is treated as absent.
    pub fn new(customer_id: impl Into<String>, warehouse_id: Option<String>) -> Self {
        Self {
            customer_id: customer_id.into(),
            warehouse_id: warehouse_id.filter(|w| !w.is_empty()),
        }
    }

    /// Warehouse-specific key, only when a warehouse id is present.
    pub fn warehouse_key(&self) -> Option<String> {
        self.warehouse_id
            .as_ref()
            .map(|w| format!("route:{}:{}", self.customer_id, w))
    }

    /// Customer-level key. Never depends on the warehouse id.
    pub fn customer_key(&self) -> String {
        format!("route:{}", self.customer_id)
    }
}

pub fn endpoint_key(target_key: &str) -> String {
    format!("endpoint:{target_key}")
}

pub fn path_key(target_key: &str, source_path: &str) -> String {
    format!("path:{target_key}:{source_path}")
}
