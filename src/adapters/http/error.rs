//! HTTP error mapping.
//!
//! Every handler returns `Result<_, ApiError>`. The status code is derived
//! from the `ErrorCode`; the body is `{"errorCode", "message"}`. Messages
//! for server-side failures are replaced with a generic text so storage or
//! provider detail never reaches the caller.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainError, ErrorCode, ValidationError};

/// Standard error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub error_code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
        }
    }
}

/// Error returned by HTTP handlers.
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        status_for(self.0.code)
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self(err.into())
    }
}

pub fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::Unauthenticated => StatusCode::UNAUTHORIZED,
        ErrorCode::Forbidden => StatusCode::FORBIDDEN,
        ErrorCode::InvalidSignature | ErrorCode::ValidationFailed => StatusCode::BAD_REQUEST,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::AlreadyProcessed | ErrorCode::InvalidStateTransition => StatusCode::CONFLICT,
        ErrorCode::StorageError | ErrorCode::Timeout => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::ExternalProviderError => StatusCode::BAD_GATEWAY,
        ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Message shown to callers for a given error.
fn public_message(err: &DomainError) -> String {
    match err.code {
        ErrorCode::StorageError | ErrorCode::Timeout => {
            "Service temporarily unavailable, please retry".to_string()
        }
        ErrorCode::ExternalProviderError => "Payment provider request failed".to_string(),
        ErrorCode::InternalError => "Internal server error".to_string(),
        ErrorCode::InvalidSignature => "Webhook verification failed".to_string(),
        _ => err.message.clone(),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = %self.0.code, error = %self.0.message, "Request failed");
        } else {
            tracing::debug!(code = %self.0.code, error = %self.0.message, "Request rejected");
        }

        let body = ErrorResponse::new(self.0.code.to_string(), public_message(&self.0));
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_of(response: Response) -> ErrorResponse {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn maps_codes_to_statuses() {
        assert_eq!(status_for(ErrorCode::Unauthenticated), StatusCode::UNAUTHORIZED);
        assert_eq!(status_for(ErrorCode::Forbidden), StatusCode::FORBIDDEN);
        assert_eq!(status_for(ErrorCode::InvalidSignature), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorCode::ValidationFailed), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorCode::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_for(ErrorCode::AlreadyProcessed), StatusCode::CONFLICT);
        assert_eq!(status_for(ErrorCode::InvalidStateTransition), StatusCode::CONFLICT);
        assert_eq!(status_for(ErrorCode::StorageError), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(status_for(ErrorCode::Timeout), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(status_for(ErrorCode::ExternalProviderError), StatusCode::BAD_GATEWAY);
        assert_eq!(status_for(ErrorCode::InternalError), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn storage_detail_is_not_exposed() {
        let err = DomainError::storage("connection refused to 10.0.0.5:5432");
        let response = ApiError(err).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body = body_of(response).await;
        assert_eq!(body.error_code, "STORAGE_ERROR");
        assert!(!body.message.contains("10.0.0.5"));
    }

    #[tokio::test]
    async fn client_errors_keep_their_message() {
        let err = DomainError::validation("counter", "unknown usage counter 'uploads'");
        let body = body_of(ApiError(err).into_response()).await;
        assert_eq!(body.error_code, "VALIDATION_FAILED");
        assert_eq!(body.message, "unknown usage counter 'uploads'");
    }

    #[tokio::test]
    async fn signature_failures_use_generic_message() {
        let err = DomainError::new(ErrorCode::InvalidSignature, "v1 mismatch for t=1704067200");
        let body = body_of(ApiError(err).into_response()).await;
        assert_eq!(body.message, "Webhook verification failed");
    }
}
