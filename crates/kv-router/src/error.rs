//! Classified routing failures and their HTTP mapping.
//!
//! Every failure the router can produce is one variant here; status codes
//! and messages are assigned in one place. Callers may match on message
//! substrings, so the texts are stable.

use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("Invalid or missing JSON body")]
    InvalidBody,

    #[error("Missing data field in request body")]
    MissingDataField,

    #[error("Invalid JSON in data field")]
    InvalidDataField,

    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Method {0} not supported")]
    UnsupportedMethod(Method),

    #[error("No routing found for customerId={customer_id}{}", warehouse_suffix(.warehouse_id))]
    RoutingNotFound {
        customer_id: String,
        warehouse_id: Option<String>,
    },

    #[error("Invalid destination path: {path}")]
    InvalidDestination { path: String },

    #[error("No endpoint found for target {target_key}")]
    EndpointNotFound { target_key: String },

    #[error("Internal server error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal server error: invalid endpoint URL {endpoint}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("Internal server error: failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Internal server error: upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),
}

fn warehouse_suffix(warehouse_id: &Option<String>) -> String {
    warehouse_id
        .as_ref()
        .map(|w| format!(", warehouseId={w}"))
        .unwrap_or_default()
}

impl RouteError {
    pub fn status(&self) -> StatusCode {
        match self {
            RouteError::InvalidBody
            | RouteError::MissingDataField
            | RouteError::InvalidDataField
            | RouteError::MissingParameter(_)
            | RouteError::InvalidDestination { .. } => StatusCode::BAD_REQUEST,
            RouteError::UnsupportedMethod(_) => StatusCode::METHOD_NOT_ALLOWED,
            RouteError::RoutingNotFound { .. } | RouteError::EndpointNotFound { .. } => {
                StatusCode::NOT_FOUND
            }
            RouteError::Store(_)
            | RouteError::InvalidEndpoint { .. }
            | RouteError::Encode(_)
            | RouteError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RouteError {
    fn into_response(self) -> Response {
        (
            self.status(),
            axum::Json(serde_json::json!({ "error": self.to_string() })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_table() {
        let cases = [
            (RouteError::InvalidBody, 400),
            (RouteError::MissingDataField, 400),
            (RouteError::InvalidDataField, 400),
            (RouteError::MissingParameter("customerId"), 400),
            (RouteError::UnsupportedMethod(Method::DELETE), 405),
            (
                RouteError::RoutingNotFound {
                    customer_id: "C".into(),
                    warehouse_id: None,
                },
                404,
            ),
            (
                RouteError::EndpointNotFound {
                    target_key: "T".into(),
                },
                404,
            ),
            (
                RouteError::InvalidEndpoint {
                    endpoint: "nope".into(),
                    reason: "relative URL without a base".into(),
                },
                500,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(err.status().as_u16(), status, "{err}");
        }
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            RouteError::MissingParameter("customerId").to_string(),
            "Missing required parameter: customerId"
        );
        assert_eq!(
            RouteError::UnsupportedMethod(Method::PATCH).to_string(),
            "Method PATCH not supported"
        );
        assert_eq!(
            RouteError::RoutingNotFound {
                customer_id: "NESTLE".into(),
                warehouse_id: Some("GDEC-01".into()),
            }
            .to_string(),
            "No routing found for customerId=NESTLE, warehouseId=GDEC-01"
        );
        assert_eq!(
            RouteError::RoutingNotFound {
                customer_id: "NESTLE".into(),
                warehouse_id: None,
            }
            .to_string(),
            "No routing found for customerId=NESTLE"
        );
        assert_eq!(
            RouteError::EndpointNotFound {
                target_key: "TARGET_A".into()
            }
            .to_string(),
            "No endpoint found for target TARGET_A"
        );
    }

    #[tokio::test]
    async fn test_response_is_json_error_object() {
        let response = RouteError::InvalidBody.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "application/json"
        );

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value, serde_json::json!({ "error": "Invalid or missing JSON body" }));
    }
}
