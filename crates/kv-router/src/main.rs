//! kv-router: forwards HTTP requests to backends selected by customer and
//! warehouse identifiers looked up in a key-value store.

mod config;
mod error;
mod proxy;
mod route;
mod server;
mod stats;
mod store;

use std::time::Duration;

use config::RouterConfig;
use server::AppState;
use stats::RouterStats;

fn main() -> anyhow::Result<()> {
    // Parse CLI args
    let args: Vec<String> = std::env::args().collect();
    let config_path = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1).cloned())
        .or_else(|| args.get(1).filter(|a| !a.starts_with('-')).cloned())
        .or_else(|| std::env::var("KV_ROUTER_CONFIG").ok())
        .unwrap_or_else(|| "kv-router.toml".to_string());

    let listen_override = args
        .iter()
        .position(|a| a == "--listen")
        .and_then(|i| args.get(i + 1).cloned());

    // Load configuration
    let mut config = RouterConfig::load(&config_path)?;

    // CLI overrides take precedence over TOML and env vars
    if let Some(addr) = listen_override {
        config.server.listen_address = addr;
    }

    // Build the tokio runtime first; the tonic gRPC exporter needs a reactor context
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let tracing_guard = kv_router_tracing::init_tracing(&config.tracing);

        tracing::info!(
            config_path = %config_path,
            listen_address = %config.server.listen_address,
            store_backend = ?config.store.backend,
            admin_enabled = config.admin.enabled,
            otlp_enabled = tracing_guard.otlp_enabled(),
            "Starting kv-router"
        );

        run(config).await
    })
}

async fn run(config: RouterConfig) -> anyhow::Result<()> {
    let mut builder = reqwest::Client::builder();
    if let Some(secs) = config.forward.timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    let client = builder.build()?;

    let store = store::from_config(&config.store)?;

    let state = AppState {
        config,
        client,
        store,
        stats: RouterStats::new(),
    };

    server::run(state).await
}
