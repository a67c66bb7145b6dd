//! Authentication types for the domain layer.
//!
//! These types represent a caller whose Firebase ID token or session
//! cookie has been verified. They carry no provider types, so any
//! `SessionValidator` adapter can produce them.

use super::UserId;
use thiserror::Error;

/// Caller identity extracted from a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// The Firebase uid.
    pub id: UserId,
    /// Email claim. Anonymous and phone sign-ins have none.
    pub email: Option<String>,
    pub email_verified: bool,
}

impl AuthenticatedUser {
    pub fn new(id: UserId, email: Option<String>, email_verified: bool) -> Self {
        Self {
            id,
            email,
            email_verified,
        }
    }
}

/// Which kind of credential the caller presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
    /// `Authorization: Bearer <id token>`.
    IdToken,
    /// Long-lived session cookie minted by the Firebase Admin SDK.
    SessionCookie,
}

/// Authentication errors that can occur during token validation.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// The token is malformed, has a bad signature, or wrong issuer/audience.
    #[error("Invalid or expired token")]
    InvalidToken,

    /// The token has expired.
    #[error("Token expired")]
    TokenExpired,

    /// Authenticated, but not allowed to perform this action.
    #[error("Insufficient permissions")]
    InsufficientPermissions,

    /// Signing keys could not be fetched.
    #[error("Auth service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AuthError {
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable(message.into())
    }

    /// Returns true if this error indicates the user should re-authenticate.
    pub fn requires_reauthentication(&self) -> bool {
        matches!(self, AuthError::InvalidToken | AuthError::TokenExpired)
    }

    /// Returns true if this is a transient error that may succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, AuthError::ServiceUnavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authenticated_user_keeps_claims() {
        let user = AuthenticatedUser::new(
            UserId::new("alice").unwrap(),
            Some("alice@example.com".to_string()),
            true,
        );
        assert_eq!(user.id.as_str(), "alice");
        assert_eq!(user.email.as_deref(), Some("alice@example.com"));
        assert!(user.email_verified);
    }

    #[test]
    fn expired_and_invalid_tokens_require_reauthentication() {
        assert!(AuthError::InvalidToken.requires_reauthentication());
        assert!(AuthError::TokenExpired.requires_reauthentication());
        assert!(!AuthError::service_unavailable("jwks down").requires_reauthentication());
    }

    #[test]
    fn only_service_unavailable_is_transient() {
        assert!(AuthError::service_unavailable("timeout").is_transient());
        assert!(!AuthError::InvalidToken.is_transient());
        assert!(!AuthError::InsufficientPermissions.is_transient());
    }
}
