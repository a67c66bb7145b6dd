//! Session validation port for Firebase credentials.
//!
//! Two credential kinds reach the service: short-lived ID tokens sent as
//! bearer tokens, and session cookies minted server-side. Both are JWTs
//! with different issuers.
//!
//! All implementations MUST validate issuer, audience and expiry.

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedUser, CredentialKind};

/// Validates caller credentials and extracts user identity.
///
/// # Contract
///
/// - `AuthError::InvalidToken` for malformed or badly signed credentials
/// - `AuthError::TokenExpired` for expired credentials
/// - `AuthError::ServiceUnavailable` when signing keys can't be fetched
#[async_trait]
pub trait SessionValidator: Send + Sync {
    /// Verifies a Firebase ID token.
    async fn verify_id_token(&self, token: &str) -> Result<AuthenticatedUser, AuthError>;

    /// Verifies a Firebase session cookie.
    async fn verify_session_cookie(&self, cookie: &str) -> Result<AuthenticatedUser, AuthError>;

    /// Dispatches on the credential kind.
    async fn verify(
        &self,
        credential: &str,
        kind: CredentialKind,
    ) -> Result<AuthenticatedUser, AuthError> {
        match kind {
            CredentialKind::IdToken => self.verify_id_token(credential).await,
            CredentialKind::SessionCookie => self.verify_session_cookie(credential).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::UserId;

    struct Fixed;

    #[async_trait]
    impl SessionValidator for Fixed {
        async fn verify_id_token(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
            match token {
                "id-ok" => Ok(AuthenticatedUser::new(UserId::new("from-token").unwrap(), None, false)),
                _ => Err(AuthError::InvalidToken),
            }
        }

        async fn verify_session_cookie(&self, cookie: &str) -> Result<AuthenticatedUser, AuthError> {
            match cookie {
                "cookie-ok" => Ok(AuthenticatedUser::new(UserId::new("from-cookie").unwrap(), None, false)),
                _ => Err(AuthError::TokenExpired),
            }
        }
    }

    #[tokio::test]
    async fn verify_dispatches_on_kind() {
        let v = Fixed;
        let user = v.verify("id-ok", CredentialKind::IdToken).await.unwrap();
        assert_eq!(user.id.as_str(), "from-token");

        let user = v.verify("cookie-ok", CredentialKind::SessionCookie).await.unwrap();
        assert_eq!(user.id.as_str(), "from-cookie");

        assert!(matches!(
            v.verify("id-ok", CredentialKind::SessionCookie).await,
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn session_validator_is_object_safe() {
        fn _accepts_dyn(_v: &dyn SessionValidator) {}
    }
}
