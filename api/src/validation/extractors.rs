//! Validated request data and the 400 rejection
//!
//! The validation middleware stores a [`ValidatedRequest`] in the request
//! extensions; handlers read it back through [`Validated`], which
//! deserializes each normalized section into a typed struct.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::schema::NormalizedInput;
use super::validators::ValidationError;
use crate::error::{set_correlation_id, ApiError};

/// One entry of the 400 response body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueBody {
    pub path: String,
    pub message: String,
    pub code: String,
}

impl From<&ValidationError> for IssueBody {
    fn from(error: &ValidationError) -> Self {
        Self {
            path: error.path.clone(),
            message: error.message.clone(),
            code: error.code().to_string(),
        }
    }
}

/// Validation rejection response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ValidationRejectionBody {
    pub status: u16,
    pub errors: Vec<IssueBody>,
}

/// Rejection that short-circuits a request, `400 Bad Request` unless overridden
#[derive(Debug)]
pub struct ValidationRejection {
    pub status: StatusCode,
    pub errors: Vec<IssueBody>,
}

impl ValidationRejection {
    pub fn new(errors: &[ValidationError]) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            errors: errors.iter().map(IssueBody::from).collect(),
        }
    }

    pub fn single(path: impl Into<String>, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            errors: vec![IssueBody {
                path: path.into(),
                message: message.into(),
                code: code.into(),
            }],
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }
}

impl IntoResponse for ValidationRejection {
    fn into_response(self) -> Response {
        let body = ValidationRejectionBody {
            status: self.status.as_u16(),
            errors: self.errors,
        };
        let mut response = (self.status, Json(body)).into_response();
        set_correlation_id(&mut response, &Uuid::new_v4().to_string());
        response
    }
}

/// Normalized request sections, stored in request extensions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedRequest {
    pub body: Map<String, Value>,
    pub query: Map<String, Value>,
    pub params: Map<String, Value>,
}

impl From<NormalizedInput> for ValidatedRequest {
    fn from(input: NormalizedInput) -> Self {
        Self {
            body: input.body,
            query: input.query,
            params: input.params,
        }
    }
}

/// Placeholder for a section a route declares no fields for
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct NoFields {}

/// Typed view of a [`ValidatedRequest`]
///
/// ```ignore
/// pub async fn get_user(
///     Validated { params, .. }: Validated<NoFields, NoFields, UserPath>,
/// ) -> ApiResult<Json<User>> { ... }
/// ```
#[derive(Debug)]
pub struct Validated<B = NoFields, Q = NoFields, P = NoFields> {
    pub body: B,
    pub query: Q,
    pub params: P,
}

#[async_trait]
impl<S, B, Q, P> FromRequestParts<S> for Validated<B, Q, P>
where
    S: Send + Sync,
    B: DeserializeOwned + Send,
    Q: DeserializeOwned + Send,
    P: DeserializeOwned + Send,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let validated = parts.extensions.get::<ValidatedRequest>().ok_or_else(|| {
            tracing::error!(uri = %parts.uri, "handler reached without request validation");
            ApiError::internal("Request was not validated")
        })?;

        Ok(Self {
            body: section(&validated.body, "body")?,
            query: section(&validated.query, "query")?,
            params: section(&validated.params, "params")?,
        })
    }
}

fn section<T: DeserializeOwned>(data: &Map<String, Value>, name: &str) -> Result<T, ApiError> {
    serde_json::from_value(Value::Object(data.clone())).map_err(|err| {
        tracing::error!(section = name, error = %err, "normalized input does not match handler type");
        ApiError::internal("Validated input could not be read")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::validators::ErrorKind;
    use axum::http::Request;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Body {
        name: String,
    }

    #[test]
    fn test_issue_body_from_error() {
        let error = ValidationError::new("email", ErrorKind::FormatInvalid, "Invalid email format")
            .within("body");
        let issue = IssueBody::from(&error);
        assert_eq!(issue.path, "body.email");
        assert_eq!(issue.code, "invalid_format");
    }

    #[tokio::test]
    async fn test_rejection_response() {
        let errors = vec![
            ValidationError::new("name", ErrorKind::RequiredFieldMissing, "Name is required").within("body"),
            ValidationError::new("id", ErrorKind::FormatInvalid, "Invalid user ID format").within("params"),
        ];
        let response = ValidationRejection::new(&errors).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], 400);
        assert_eq!(body["errors"][0], json!({"path": "body.name", "message": "Name is required", "code": "required"}));
        assert_eq!(body["errors"][1]["path"], "params.id");
    }

    #[tokio::test]
    async fn test_validated_extractor_reads_extension() {
        let mut body = Map::new();
        body.insert("name".into(), json!("Jo"));
        let (mut parts, _) = Request::builder().uri("/").body(()).unwrap().into_parts();
        parts.extensions.insert(ValidatedRequest {
            body,
            ..ValidatedRequest::default()
        });

        let validated: Validated<Body> = Validated::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(validated.body.name, "Jo");
    }

    #[tokio::test]
    async fn test_validated_extractor_without_extension() {
        let (mut parts, _) = Request::builder().uri("/").body(()).unwrap().into_parts();
        let err = Validated::<Body>::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
