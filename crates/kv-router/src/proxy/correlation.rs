//! Correlation ID generation for request tracing.

use uuid::Uuid;

/// Header carrying the router's request id to the backend and back to the caller.
pub const CORRELATION_HEADER: &str = "x-router-request-id";

/// Generate a new correlation ID (UUID v4).
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}
