//! Forward a routed request to its backend and relay the response.
//!
//! The response body is streamed back verbatim; status and headers are
//! copied as received, minus connection-scoped framing headers.

use std::time::Instant;

use axum::body::Body;
use axum::http::{HeaderMap, HeaderValue, Method};
use axum::response::Response;
use bytes::Bytes;
use reqwest::Url;
use tracing::Instrument;

use super::correlation::CORRELATION_HEADER;
use crate::error::RouteError;

/// Headers that should NOT be forwarded (hop-by-hop headers).
const HOP_BY_HOP_HEADERS: &[&str] = &[
    "host",
    "connection",
    "transfer-encoding",
    "keep-alive",
    "upgrade",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailers",
];

/// Build the outbound URL: `destination_path` plus the original query
/// string, resolved against `endpoint` as a base.
///
/// The endpoint always supplies scheme, host and port. A destination that
/// names its own authority (`//host/...`, `http://host/...`, or anything
/// else that resolves off the endpoint's origin) is rejected. An absolute
/// destination path replaces whatever path the endpoint carries; a relative
/// one resolves against it.
pub fn destination_url(
    endpoint: &str,
    destination_path: &str,
    query: Option<&str>,
) -> Result<Url, RouteError> {
    let invalid = |reason: String| RouteError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason,
    };
    let foreign = || RouteError::InvalidDestination {
        path: destination_path.to_string(),
    };

    let base = Url::parse(endpoint).map_err(|e| invalid(e.to_string()))?;
    if !matches!(base.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme {}", base.scheme())));
    }

    if destination_path.starts_with("//") || Url::parse(destination_path).is_ok() {
        return Err(foreign());
    }

    let reference = match query {
        Some(q) => format!("{destination_path}?{q}"),
        None => destination_path.to_string(),
    };
    let url = base.join(&reference).map_err(|_| foreign())?;

    // Backslashes count as slashes for http(s), so `/\host` can still escape
    if url.origin() != base.origin() {
        return Err(foreign());
    }
    Ok(url)
}

/// Send the request to `url` with the original method and headers and
/// stream the backend's response back.
///
/// Transport failures are returned as [`RouteError::Upstream`]; there is
/// no retry.
pub async fn forward(
    client: &reqwest::Client,
    method: Method,
    url: Url,
    headers: &HeaderMap,
    body: Option<Bytes>,
    correlation_id: &str,
) -> Result<Response, RouteError> {
    let host = url.host_str().unwrap_or("unknown").to_string();
    let span = kv_router_tracing::forward_span!(correlation_id, host);
    let start = Instant::now();

    async {
        let mut req_builder = client
            .request(method, url)
            .header(CORRELATION_HEADER, correlation_id);

        for (name, value) in headers.iter() {
            let name_str = name.as_str();
            if HOP_BY_HOP_HEADERS.contains(&name_str) || name_str == CORRELATION_HEADER {
                continue;
            }
            // reqwest sets content-length from the body actually sent, which
            // is re-encoded and may differ in size from the inbound one
            if name_str == "content-length" {
                continue;
            }
            req_builder = req_builder.header(name, value);
        }

        if let Some(body) = body {
            req_builder = req_builder.body(body);
        }

        let result = req_builder.send().await;
        let latency = start.elapsed().as_millis() as u64;
        tracing::Span::current().record("latency_ms", latency);

        let upstream_resp = match result {
            Ok(resp) => resp,
            Err(e) => {
                tracing::error!(error = %e, latency_ms = latency, "Upstream request failed");
                return Err(RouteError::Upstream(e));
            }
        };

        let status = upstream_resp.status();
        tracing::Span::current().record("status", status.as_u16());
        tracing::info!(status = status.as_u16(), latency_ms = latency, "Forward complete");

        Ok(build_response(upstream_resp, correlation_id))
    }
    .instrument(span)
    .await
}

/// Build an axum Response from the upstream response, streaming the body back.
fn build_response(upstream_resp: reqwest::Response, correlation_id: &str) -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = upstream_resp.status();

    let headers = response.headers_mut();
    for (name, value) in upstream_resp.headers().iter() {
        if HOP_BY_HOP_HEADERS.contains(&name.as_str()) {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }
    headers.insert(
        CORRELATION_HEADER,
        HeaderValue::from_str(correlation_id)
            .unwrap_or_else(|_| HeaderValue::from_static("unknown")),
    );

    *response.body_mut() = Body::from_stream(upstream_resp.bytes_stream());
    response
}
