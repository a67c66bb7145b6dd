//! Errors raised while authenticating and decoding provider webhooks.

use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode};

/// Errors that occur before a webhook event is trusted.
///
/// Every variant is permanent: redelivering the same bytes with the same
/// header cannot succeed, so none of them should trigger a retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WebhookError {
    /// HMAC did not match.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Signed timestamp is older than the replay window.
    #[error("Timestamp out of range")]
    TimestampOutOfRange,

    /// Signed timestamp is too far in the future.
    #[error("Invalid timestamp")]
    InvalidTimestamp,

    /// Signature header could not be parsed.
    #[error("Malformed signature header: {0}")]
    MalformedHeader(String),

    /// Signature was valid but the body is not a provider event.
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// A test-mode event reached a deployment that only accepts live events.
    #[error("Test-mode event rejected")]
    LivemodeMismatch,
}

impl WebhookError {
    /// True when the failure means the sender could not be authenticated.
    pub fn is_authentication_failure(&self) -> bool {
        !matches!(self, WebhookError::MalformedPayload(_))
    }
}

impl From<WebhookError> for DomainError {
    fn from(err: WebhookError) -> Self {
        let code = if err.is_authentication_failure() {
            ErrorCode::InvalidSignature
        } else {
            ErrorCode::ValidationFailed
        };
        DomainError::new(code, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_failures_map_to_invalid_signature() {
        for err in [
            WebhookError::InvalidSignature,
            WebhookError::TimestampOutOfRange,
            WebhookError::InvalidTimestamp,
            WebhookError::MalformedHeader("no t=".to_string()),
            WebhookError::LivemodeMismatch,
        ] {
            let domain: DomainError = err.into();
            assert_eq!(domain.code, ErrorCode::InvalidSignature);
        }
    }

    #[test]
    fn malformed_payload_maps_to_validation_failure() {
        let domain: DomainError = WebhookError::MalformedPayload("eof".to_string()).into();
        assert_eq!(domain.code, ErrorCode::ValidationFailed);
        assert!(!domain.is_retryable());
    }
}
