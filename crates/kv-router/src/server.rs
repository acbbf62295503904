//! Axum HTTP server: router, listener, graceful shutdown.
//!
//! Every path not reserved below is routed through the key-value store and
//! forwarded to the resolved backend.

use std::sync::Arc;

use axum::extract::{Path, Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use bytes::Bytes;
use tower_http::trace::TraceLayer;
use tracing::Instrument;

use crate::config::RouterConfig;
use crate::error::RouteError;
use crate::proxy::{correlation, forward};
use crate::route::{self, extract, RoutedMethod};
use crate::stats::RouterStats;
use crate::store::KvStore;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: RouterConfig,
    pub client: reqwest::Client,
    pub store: Arc<dyn KvStore>,
    pub stats: RouterStats,
}

/// Assemble the axum router. The store admin routes exist only when
/// `admin.enabled` is set.
pub fn app(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/health", get(handle_health))
        .route("/_router/stats", get(handle_get_stats));

    if state.config.admin.enabled {
        router = router.route(
            "/_router/kv/{*key}",
            get(handle_kv_get).put(handle_kv_put).delete(handle_kv_delete),
        );
    }

    router
        .fallback(handle_route)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Build and run the HTTP server.
pub async fn run(state: AppState) -> anyhow::Result<()> {
    let listen_addr = state.config.server.listen_address.clone();
    let app = app(state);

    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    tracing::info!(address = %listen_addr, "kv-router listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("kv-router shut down gracefully");
    Ok(())
}

/// Catch-all handler: resolve the backend for this request and forward it.
async fn handle_route(State(state): State<Arc<AppState>>, request: Request) -> Response {
    let correlation_id = correlation::generate_id();
    let span = kv_router_tracing::route_request_span!(
        &correlation_id,
        request.method(),
        request.uri().path()
    );

    state.stats.inc_requests();

    async {
        let response = match route_request(&state, request, &correlation_id).await {
            Ok(response) => {
                state.stats.inc_forwarded();
                response
            }
            Err(e) => {
                if e.status().is_server_error() {
                    state.stats.inc_failed();
                    tracing::error!(error = %e, "Routing failed");
                } else {
                    state.stats.inc_rejected();
                    tracing::warn!(error = %e, status = e.status().as_u16(), "Request rejected");
                }
                e.into_response()
            }
        };
        tracing::Span::current().record("status", response.status().as_u16());
        response
    }
    .instrument(span)
    .await
}

/// Extract parameters, resolve the route, forward.
///
/// The method is checked before the body is read or the store consulted.
async fn route_request(
    state: &AppState,
    request: Request,
    correlation_id: &str,
) -> Result<Response, RouteError> {
    let method = RoutedMethod::try_from(request.method())?;
    let (parts, body) = request.into_parts();

    let params = match method {
        RoutedMethod::Get => extract::from_query(&parts.uri)?,
        RoutedMethod::Post => {
            let bytes = axum::body::to_bytes(body, state.config.server.max_body_bytes)
                .await
                .map_err(|e| {
                    tracing::warn!(error = %e, "Failed to read request body");
                    RouteError::InvalidBody
                })?;
            extract::from_json_body(&bytes)?
        }
    };

    let span = tracing::Span::current();
    span.record("customer_id", params.key.customer_id.as_str());
    if let Some(ref warehouse_id) = params.key.warehouse_id {
        span.record("warehouse_id", warehouse_id.as_str());
    }

    let source_path = parts.uri.path();
    let route = route::resolve(state.store.as_ref(), &params.key, source_path).await?;
    tracing::info!(
        target_key = %route.target_key,
        endpoint = %route.endpoint,
        destination_path = %route.destination_path,
        "Route resolved"
    );

    let url = forward::destination_url(&route.endpoint, &route.destination_path, parts.uri.query())?;

    let body = match params.raw_body {
        Some(ref raw) => Some(Bytes::from(serde_json::to_vec(raw)?)),
        None => None,
    };

    forward::forward(
        &state.client,
        parts.method,
        url,
        &parts.headers,
        body,
        correlation_id,
    )
    .await
}

/// GET /_router/stats: return current routing counters.
async fn handle_get_stats(State(state): State<Arc<AppState>>) -> Response {
    axum::Json(state.stats.snapshot()).into_response()
}

/// GET /_router/kv/{key}: read one store entry as plain text.
async fn handle_kv_get(State(state): State<Arc<AppState>>, Path(key): Path<String>) -> Response {
    match state.store.get(&key).await {
        Ok(Some(value)) => (StatusCode::OK, value).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            axum::Json(serde_json::json!({ "error": format!("Key {key} not found") })),
        )
            .into_response(),
        Err(e) => RouteError::from(e).into_response(),
    }
}

/// PUT /_router/kv/{key}: store the request body as the value.
async fn handle_kv_put(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    value: String,
) -> Response {
    match state.store.put(&key, &value).await {
        Ok(()) => {
            tracing::info!(key = %key, "Store entry written");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => RouteError::from(e).into_response(),
    }
}

/// DELETE /_router/kv/{key}: remove one store entry.
async fn handle_kv_delete(State(state): State<Arc<AppState>>, Path(key): Path<String>) -> Response {
    match state.store.delete(&key).await {
        Ok(()) => {
            tracing::info!(key = %key, "Store entry deleted");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => RouteError::from(e).into_response(),
    }
}

/// Health check endpoint.
async fn handle_health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// Wait for SIGINT (Ctrl+C) for graceful shutdown.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install CTRL+C signal handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, draining connections...");
}
