// Error handling types for the API

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::fmt;
use tracing::error;

use super::validation::ValidationResult;
use crate::store::StoreError;

/// API error types
#[derive(Debug)]
pub enum ApiError {
    Unauthorized(String),
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Upstream(String),
    InternalServer(String),
    StoreError(StoreError),
    ValidationError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::Upstream(msg) => write!(f, "Upstream Error: {}", msg),
            ApiError::InternalServer(msg) => write!(f, "Internal Server Error: {}", msg),
            ApiError::StoreError(e) => write!(f, "Store Error: {}", e),
            ApiError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
        }
    }
}

/// JSON error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_message, code) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg, "UNAUTHORIZED"),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, "BAD_REQUEST"),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, "NOT_FOUND"),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg, "CONFLICT"),
            ApiError::Upstream(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg, "UPSTREAM_ERROR"),
            ApiError::InternalServer(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                msg,
                "INTERNAL_SERVER_ERROR",
            ),
            ApiError::StoreError(e) => {
                error!(error = %e, "Store error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Store operation failed".to_string(),
                    "STORE_ERROR",
                )
            }
            ApiError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg, "VALIDATION_ERROR"),
        };

        let error_response = ErrorResponse {
            error: error_message,
            code: code.to_string(),
        };

        (status, Json(error_response)).into_response()
    }
}

/// Conflicts and missing items keep their own status so callers can react
/// (pick a new id, stop retrying). Engine outages are upstream failures; the
/// remaining store errors are our own bugs. Both are opaque 500s.
impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::AlreadyExists => ApiError::Conflict("record already exists".to_string()),
            StoreError::NotFound => ApiError::NotFound("record not found".to_string()),
            StoreError::Database(_) | StoreError::Dynamo(_) => {
                error!(error = %e, "Persistence engine failure");
                ApiError::Upstream("storage temporarily unavailable".to_string())
            }
            other => ApiError::StoreError(other),
        }
    }
}

/// Helper function to convert ValidationResult to ApiError
impl From<ValidationResult> for ApiError {
    fn from(result: ValidationResult) -> Self {
        if result.is_valid {
            ApiError::InternalServer(
                "Validation result was valid but converted to error".to_string(),
            )
        } else {
            let error_messages: Vec<String> = result
                .errors
                .iter()
                .map(|e| format!("{}: {}", e.field, e.message))
                .collect();
            ApiError::ValidationError(error_messages.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn test_store_error_mapping() {
        assert!(matches!(
            ApiError::from(StoreError::AlreadyExists),
            ApiError::Conflict(_)
        ));
        assert!(matches!(
            ApiError::from(StoreError::NotFound),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            ApiError::from(StoreError::Dynamo("boom".to_string())),
            ApiError::Upstream(_)
        ));
        assert!(matches!(
            ApiError::from(StoreError::Database(sqlx::Error::PoolTimedOut)),
            ApiError::Upstream(_)
        ));
        assert!(matches!(
            ApiError::from(StoreError::MissingKey("userId".to_string())),
            ApiError::StoreError(_)
        ));
    }

    #[tokio::test]
    async fn test_conflict_response_status() {
        let response = ApiError::from(StoreError::AlreadyExists).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_engine_failure_body_hides_detail() {
        let response =
            ApiError::from(StoreError::Dynamo("secret table layout".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("UPSTREAM_ERROR"));
        assert!(!text.contains("secret table layout"));
    }

    #[tokio::test]
    async fn test_internal_store_error_body_hides_detail() {
        let response =
            ApiError::from(StoreError::MissingKey("todoId".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("STORE_ERROR"));
        assert!(!text.contains("todoId"));
    }

    #[test]
    fn test_validation_result_conversion() {
        let mut result = ValidationResult::new();
        result.add_error("text", "must not be empty");

        match ApiError::from(result) {
            ApiError::ValidationError(msg) => assert_eq!(msg, "text: must not be empty"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
