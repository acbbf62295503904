//! Configuration types and loading logic.

use std::collections::HashMap;

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use kv_router_tracing::TracingConfig;
use serde::Deserialize;

/// Top-level router configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RouterConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub forward: ForwardConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub tracing: TracingConfig,
}

/// Server listen configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen_address")]
    pub listen_address: String,

    /// Largest inbound body accepted, in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

/// Outbound forwarding configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ForwardConfig {
    /// Overall timeout for a forwarded call. Unset leaves the HTTP
    /// client's default (no timeout).
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Which key-value backend to read routes from.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    Cloudflare,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    #[serde(default)]
    pub memory: MemoryStoreConfig,
    #[serde(default)]
    pub cloudflare: CloudflareStoreConfig,
}

/// Seed entries for the in-memory backend, e.g.
/// `"route:NESTLE:GDEC-01" = "TARGET_A"`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MemoryStoreConfig {
    #[serde(default)]
    pub entries: HashMap<String, String>,
}

/// Cloudflare Workers KV namespace accessed over the REST API.
#[derive(Debug, Clone, Deserialize)]
pub struct CloudflareStoreConfig {
    #[serde(default = "default_cloudflare_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub account_id: String,

    #[serde(default)]
    pub namespace_id: String,

    #[serde(default)]
    pub api_token: String,

    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Administrative endpoints under `/_router/kv`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminConfig {
    #[serde(default)]
    pub enabled: bool,
}

fn default_listen_address() -> String {
    "0.0.0.0:3080".to_string()
}

fn default_max_body_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_cloudflare_base_url() -> String {
    "https://api.cloudflare.com/client/v4".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl Default for CloudflareStoreConfig {
    fn default() -> Self {
        Self {
            base_url: default_cloudflare_base_url(),
            account_id: String::new(),
            namespace_id: String::new(),
            api_token: String::new(),
            timeout_secs: None,
        }
    }
}

impl RouterConfig {
    /// Load configuration from TOML file and environment variables.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (KV_ROUTER_ prefix, __ for nesting)
    /// 2. TOML config file
    /// 3. Defaults
    pub fn load(config_path: &str) -> anyhow::Result<Self> {
        let mut config: RouterConfig = Figment::new()
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("KV_ROUTER_").split("__"))
            .extract()?;

        // Direct env var override for the API token
        if let Ok(token) = std::env::var("KV_ROUTER_CF_API_TOKEN") {
            config.store.cloudflare.api_token = token;
        }

        Ok(config)
    }
}
