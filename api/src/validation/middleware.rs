//! Request validation middleware
//!
//! Installed per route with `route_layer`, so path parameters are already
//! matched when it runs. Either every declared field validates and the
//! request proceeds with a [`ValidatedRequest`] attached, or the request is
//! rejected (400, or 413 for an oversized body) and never reaches the handler.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    extract::{rejection::PathRejection, FromRequestParts, Path, Query, Request, State},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value};

use super::extractors::{ValidatedRequest, ValidationRejection};
use super::schema::{RequestParts, Schema};
use crate::metrics;

/// Largest request body the validator will buffer
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Validate the request against `schema` before it reaches the handler
pub async fn validate_request(
    State(schema): State<Arc<Schema>>,
    request: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();

    if declared_length(&parts).is_some_and(|length| length > MAX_BODY_BYTES) {
        return body_too_large(schema.name()).into_response();
    }

    // A client that drops mid-body never reads the reply, so a failed read
    // is only observable as the length limit
    let bytes = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(_) => return body_too_large(schema.name()).into_response(),
    };

    let body_value = match parse_body(&bytes) {
        Ok(value) => value,
        Err(message) => {
            tracing::warn!(schema = schema.name(), error = %message, "Malformed JSON body");
            return ValidationRejection::single("body", "invalid_json", message).into_response();
        }
    };

    let query = match Query::<HashMap<String, String>>::try_from_uri(&parts.uri) {
        Ok(Query(query)) => string_map(query),
        Err(err) => {
            return ValidationRejection::single("query", "invalid_query", err.body_text())
                .into_response()
        }
    };

    let params = match Path::<HashMap<String, String>>::from_request_parts(&mut parts, &()).await {
        Ok(Path(params)) => string_map(params),
        Err(PathRejection::MissingPathParams(_)) => Value::Object(Map::new()),
        Err(err) => {
            tracing::warn!(schema = schema.name(), error = %err, "Undecodable path parameters");
            return ValidationRejection::single("params", "invalid_params", err.body_text())
                .into_response();
        }
    };

    let input = RequestParts {
        body: body_value,
        query,
        params,
    };

    match schema.validate(&input) {
        Ok(normalized) => {
            parts.extensions.insert(ValidatedRequest::from(normalized));
            next.run(Request::from_parts(parts, Body::from(bytes))).await
        }
        Err(errors) => {
            tracing::warn!(
                schema = schema.name(),
                error_count = errors.len(),
                paths = ?errors.iter().map(|e| e.path.as_str()).collect::<Vec<_>>(),
                "Validation error"
            );
            metrics::observe_validation_rejection(schema.name(), errors.iter().map(|e| e.code()));
            ValidationRejection::new(&errors).into_response()
        }
    }
}

fn declared_length(parts: &Parts) -> Option<usize> {
    parts
        .headers
        .get(header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}

fn body_too_large(schema: &str) -> ValidationRejection {
    tracing::warn!(schema = schema, limit = MAX_BODY_BYTES, "Request body too large");
    ValidationRejection::single(
        "body",
        "payload_too_large",
        format!("Request body exceeds {} bytes", MAX_BODY_BYTES),
    )
    .with_status(StatusCode::PAYLOAD_TOO_LARGE)
}

fn parse_body(bytes: &Bytes) -> Result<Value, String> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_slice(bytes).map_err(|err| format!("Invalid JSON payload: {}", err))
}

fn string_map(values: HashMap<String, String>) -> Value {
    Value::Object(
        values
            .into_iter()
            .map(|(key, value)| (key, Value::String(value)))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_body_is_empty_object() {
        assert_eq!(parse_body(&Bytes::new()).unwrap(), json!({}));
        assert_eq!(parse_body(&Bytes::from_static(b" \n")).unwrap(), json!({}));
    }

    #[test]
    fn test_malformed_body() {
        let err = parse_body(&Bytes::from_static(b"{\"name\":")).unwrap_err();
        assert!(err.starts_with("Invalid JSON payload"));
    }

    #[test]
    fn test_declared_length() {
        let (parts, _) = axum::http::Request::builder()
            .header(header::CONTENT_LENGTH, "2048")
            .body(())
            .unwrap()
            .into_parts();
        assert_eq!(declared_length(&parts), Some(2048));

        let (parts, _) = axum::http::Request::builder().body(()).unwrap().into_parts();
        assert_eq!(declared_length(&parts), None);
    }

    #[test]
    fn test_body_too_large_status() {
        let rejection = body_too_large("create_user");
        assert_eq!(rejection.status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(rejection.errors[0].code, "payload_too_large");
    }

    #[test]
    fn test_string_map() {
        let mut values = HashMap::new();
        values.insert("page".to_string(), "2".to_string());
        assert_eq!(string_map(values), json!({"page": "2"}));
    }
}
