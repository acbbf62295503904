//! Key-value store abstraction consulted by the route resolver.
//!
//! The router only ever calls [`KvStore::get`] while serving traffic.
//! `put` / `delete` exist for seeding and the administrative endpoint.

mod cloudflare;
mod memory;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::{StoreBackend, StoreConfig};

pub use cloudflare::CloudflareKvStore;
pub use memory::MemoryKvStore;

/// Errors raised by a store backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("store returned status {status} for key {key}")]
    UnexpectedStatus { key: String, status: u16 },

    #[error("invalid store configuration: {0}")]
    Config(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// String-keyed, string-valued lookup service.
///
/// Reads may lag writes (eventual consistency); callers must not assume
/// read-your-writes.
#[async_trait]
pub trait KvStore: Send + Sync + 'static {
    /// Look up `key`, returning `None` when it is absent.
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Insert or overwrite `key`.
    async fn put(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Remove `key`. Deleting an absent key is not an error.
    async fn delete(&self, key: &str) -> StoreResult<()>;
}

/// Build the store backend selected in configuration.
pub fn from_config(config: &StoreConfig) -> StoreResult<Arc<dyn KvStore>> {
    match config.backend {
        StoreBackend::Memory => {
            tracing::info!(
                entries = config.memory.entries.len(),
                "Using in-memory key-value store"
            );
            Ok(Arc::new(MemoryKvStore::with_entries(
                config.memory.entries.clone(),
            )))
        }
        StoreBackend::Cloudflare => {
            let cf = &config.cloudflare;
            let mut builder = reqwest::Client::builder();
            if let Some(secs) = cf.timeout_secs {
                builder = builder.timeout(Duration::from_secs(secs));
            }
            let store = CloudflareKvStore::new(
                builder.build()?,
                &cf.base_url,
                &cf.account_id,
                &cf.namespace_id,
                cf.api_token.clone(),
            )?;
            tracing::info!(
                account_id = %cf.account_id,
                namespace_id = %cf.namespace_id,
                "Using Cloudflare Workers KV store"
            );
            Ok(Arc::new(store))
        }
    }
}
