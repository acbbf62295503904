//! Span builder helpers for kv-router instrumentation.

/// Create the top-level span for one routed request.
///
/// Usage: `let span = route_request_span!(correlation_id, method, path);`
///
/// Fields recorded later by the handler:
/// - `customer_id` / `warehouse_id`: extracted routing parameters
/// - `status`: final status code returned to the caller
#[macro_export]
macro_rules! route_request_span {
    ($correlation_id:expr, $method:expr, $path:expr) => {
        tracing::info_span!(
            "route_request",
            correlation_id = %$correlation_id,
            method = %$method,
            path = %$path,
            customer_id = tracing::field::Empty,
            warehouse_id = tracing::field::Empty,
            status = tracing::field::Empty,
        )
    };
}

/// Create a span covering the three store lookups.
#[macro_export]
macro_rules! resolve_span {
    ($customer_id:expr) => {
        tracing::debug_span!(
            "resolve_route",
            customer_id = %$customer_id,
            target_key = tracing::field::Empty,
            endpoint = tracing::field::Empty,
            destination_path = tracing::field::Empty,
        )
    };
}

/// Create a span for the outbound forward to the resolved backend.
#[macro_export]
macro_rules! forward_span {
    ($correlation_id:expr, $target:expr) => {
        tracing::info_span!(
            "forward",
            correlation_id = %$correlation_id,
            target = %$target,
            status = tracing::field::Empty,
            latency_ms = tracing::field::Empty,
        )
    };
}
