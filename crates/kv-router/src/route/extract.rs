//! Derive routing parameters from an inbound request.
//!
//! GET requests carry `customerId` / `warehouseId` in the query string.
//! POST requests carry them inside a JSON-encoded string under `data`:
//!
//! ```text
//! {"data": "{\"customerId\":\"NESTLE\",\"warehouseId\":\"GDEC-01\"}"}
//! ```

use axum::extract::Query;
use axum::http::{Method, Uri};
use serde_json::Value;

use super::keys::RoutingKey;
use crate::error::RouteError;

const CUSTOMER_ID: &str = "customerId";
const WAREHOUSE_ID: &str = "warehouseId";

/// The two methods the router forwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutedMethod {
    Get,
    Post,
}

impl TryFrom<&Method> for RoutedMethod {
    type Error = RouteError;

    fn try_from(method: &Method) -> Result<Self, Self::Error> {
        match *method {
            Method::GET => Ok(RoutedMethod::Get),
            Method::POST => Ok(RoutedMethod::Post),
            _ => Err(RouteError::UnsupportedMethod(method.clone())),
        }
    }
}

/// Parameters extracted from one request.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteParams {
    pub key: RoutingKey,
    /// The singly-parsed POST body (still holding the `data` string),
    /// re-serialized as the outbound body. `None` for GET.
    pub raw_body: Option<Value>,
}

/// Read routing parameters from the query string of a GET request.
///
/// When a parameter repeats, the first occurrence wins.
pub fn from_query(uri: &Uri) -> Result<RouteParams, RouteError> {
    let pairs = Query::<Vec<(String, String)>>::try_from_uri(uri)
        .map(|Query(pairs)| pairs)
        .unwrap_or_else(|e| {
            tracing::debug!(error = %e, "Unparseable query string, treating as empty");
            Vec::new()
        });

    let param = |name: &str| {
        pairs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
    };

    let key = routing_key(param(CUSTOMER_ID), param(WAREHOUSE_ID))?;
    Ok(RouteParams {
        key,
        raw_body: None,
    })
}

/// Read routing parameters from the body of a POST request.
pub fn from_json_body(body: &[u8]) -> Result<RouteParams, RouteError> {
    let raw_body: Value = serde_json::from_slice(body).map_err(|_| RouteError::InvalidBody)?;

    let data = match raw_body.get("data") {
        None | Some(Value::Null) => return Err(RouteError::MissingDataField),
        Some(Value::String(s)) if s.is_empty() => return Err(RouteError::MissingDataField),
        Some(Value::String(s)) => s,
        Some(_) => return Err(RouteError::InvalidDataField),
    };

    let payload: Value = serde_json::from_str(data).map_err(|_| RouteError::InvalidDataField)?;

    let key = routing_key(
        payload.get(CUSTOMER_ID).and_then(id_value),
        payload.get(WAREHOUSE_ID).and_then(id_value),
    )?;

    Ok(RouteParams {
        key,
        raw_body: Some(raw_body),
    })
}

/// Identifiers are normally strings; numbers are accepted as their JSON text.
fn id_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn routing_key(
    customer_id: Option<String>,
    warehouse_id: Option<String>,
) -> Result<RoutingKey, RouteError> {
    match customer_id {
        Some(customer_id) if !customer_id.is_empty() => {
            Ok(RoutingKey::new(customer_id, warehouse_id))
        }
        _ => Err(RouteError::MissingParameter(CUSTOMER_ID)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post_body(data: &str) -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!({ "data": data })).unwrap()
    }

    #[test]
    fn test_only_get_and_post_are_routed() {
        assert_eq!(RoutedMethod::try_from(&Method::GET).unwrap(), RoutedMethod::Get);
        assert_eq!(RoutedMethod::try_from(&Method::POST).unwrap(), RoutedMethod::Post);

        for method in [Method::PUT, Method::DELETE, Method::PATCH, Method::HEAD, Method::OPTIONS] {
            let err = RoutedMethod::try_from(&method).unwrap_err();
            assert!(matches!(err, RouteError::UnsupportedMethod(ref m) if *m == method));
            assert!(err.to_string().contains("not supported"));
        }
    }

    #[test]
    fn test_query_parameters() {
        let uri: Uri = "/api/stock?customerId=NESTLE&warehouseId=GDEC-01&page=2"
            .parse()
            .unwrap();
        let params = from_query(&uri).unwrap();

        assert_eq!(params.key, RoutingKey::new("NESTLE", Some("GDEC-01".into())));
        assert_eq!(params.raw_body, None);
    }

    #[test]
    fn test_query_without_warehouse() {
        let uri: Uri = "/api/stock?customerId=NESTLE".parse().unwrap();
        let params = from_query(&uri).unwrap();
        assert_eq!(params.key.warehouse_id, None);

        let uri: Uri = "/api/stock?customerId=NESTLE&warehouseId=".parse().unwrap();
        let params = from_query(&uri).unwrap();
        assert_eq!(params.key.warehouse_id, None);
    }

    #[test]
    fn test_query_percent_decoding_and_first_wins() {
        let uri: Uri = "/x?customerId=ACME%20CORP&customerId=OTHER".parse().unwrap();
        let params = from_query(&uri).unwrap();
        assert_eq!(params.key.customer_id, "ACME CORP");
    }

    #[test]
    fn test_query_missing_or_empty_customer() {
        for uri in ["/x", "/x?warehouseId=W1", "/x?customerId="] {
            let uri: Uri = uri.parse().unwrap();
            let err = from_query(&uri).unwrap_err();
            assert_eq!(err.to_string(), "Missing required parameter: customerId");
        }
    }

    #[test]
    fn test_post_body_keeps_singly_parsed_object() {
        let body = br#"{"data":"{\"customerId\":\"NESTLE\",\"warehouseId\":\"GDEC-01\",\"sku\":42}","source":"erp"}"#;
        let params = from_json_body(body).unwrap();

        assert_eq!(params.key, RoutingKey::new("NESTLE", Some("GDEC-01".into())));
        let raw = params.raw_body.unwrap();
        assert_eq!(raw["source"], "erp");
        assert_eq!(
            raw["data"],
            r#"{"customerId":"NESTLE","warehouseId":"GDEC-01","sku":42}"#
        );
    }

    #[test]
    fn test_post_numeric_identifiers() {
        let params = from_json_body(&post_body(r#"{"customerId":1001,"warehouseId":7}"#)).unwrap();
        assert_eq!(params.key, RoutingKey::new("1001", Some("7".into())));
    }

    #[test]
    fn test_post_invalid_body() {
        for body in [&b""[..], b"not json", b"{\"data\":"] {
            let err = from_json_body(body).unwrap_err();
            assert!(matches!(err, RouteError::InvalidBody));
            assert!(err.to_string().contains("Invalid or missing JSON body"));
        }
    }

    #[test]
    fn test_post_missing_data_field() {
        for body in [&br#"{"customerId":"NESTLE"}"#[..], br#"{"data":null}"#, br#"{"data":""}"#, b"[1,2]"] {
            let err = from_json_body(body).unwrap_err();
            assert!(matches!(err, RouteError::MissingDataField), "{err}");
            assert!(err.to_string().contains("Missing data field"));
        }
    }

    #[test]
    fn test_post_invalid_data_field() {
        let err = from_json_body(&post_body("{customerId: NESTLE")).unwrap_err();
        assert!(matches!(err, RouteError::InvalidDataField));

        // `data` must be a JSON-encoded string, not an inline object
        let err = from_json_body(br#"{"data":{"customerId":"NESTLE"}}"#).unwrap_err();
        assert!(matches!(err, RouteError::InvalidDataField));
    }

    #[test]
    fn test_post_missing_customer() {
        for data in [r#"{"warehouseId":"GDEC-01"}"#, r#"{"customerId":""}"#, r#"{"customerId":null}"#, "[]"] {
            let err = from_json_body(&post_body(data)).unwrap_err();
            assert_eq!(err.to_string(), "Missing required parameter: customerId");
        }
    }
}
