//! Mock session validator for testing.
//!
//! # Example
//!
//! ```ignore
//! use creator_vault::adapters::auth::MockSessionValidator;
//!
//! let validator = MockSessionValidator::new()
//!     .with_test_user("alice-token", "alice")
//!     .with_session_cookie("alice-cookie", "alice");
//!
//! let user = validator.verify_id_token("alice-token").await?;
//! ```

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedUser, UserId};
use crate::ports::SessionValidator;

/// Mock session validator.
///
/// Maps credentials to users. Unknown credentials return `InvalidToken`.
#[derive(Debug, Default, Clone)]
pub struct MockSessionValidator {
    id_tokens: HashMap<String, AuthenticatedUser>,
    session_cookies: HashMap<String, AuthenticatedUser>,
    /// Returned for every validation when set.
    force_error: Option<AuthError>,
}

impl MockSessionValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts `token` as an ID token for `user`.
    pub fn with_user(mut self, token: impl Into<String>, user: AuthenticatedUser) -> Self {
        self.id_tokens.insert(token.into(), user);
        self
    }

    /// Accepts `token` as an ID token for a user with a derived email.
    ///
    /// Blank user ids are ignored.
    pub fn with_test_user(self, token: impl Into<String>, uid: impl Into<String>) -> Self {
        match test_user(uid.into()) {
            Some(user) => self.with_user(token, user),
            None => self,
        }
    }

    /// Accepts `cookie` as a session cookie for the given user id.
    pub fn with_session_cookie(mut self, cookie: impl Into<String>, uid: impl Into<String>) -> Self {
        if let Some(user) = test_user(uid.into()) {
            self.session_cookies.insert(cookie.into(), user);
        }
        self
    }

    /// Forces all validations to return the specified error.
    pub fn with_error(mut self, error: AuthError) -> Self {
        self.force_error = Some(error);
        self
    }

    fn lookup(
        &self,
        map: &HashMap<String, AuthenticatedUser>,
        credential: &str,
    ) -> Result<AuthenticatedUser, AuthError> {
        if let Some(error) = &self.force_error {
            return Err(error.clone());
        }
        map.get(credential).cloned().ok_or(AuthError::InvalidToken)
    }
}

fn test_user(uid: String) -> Option<AuthenticatedUser> {
    let email = format!("{}@test.example.com", uid);
    UserId::new(uid)
        .ok()
        .map(|id| AuthenticatedUser::new(id, Some(email), true))
}

#[async_trait]
impl SessionValidator for MockSessionValidator {
    async fn verify_id_token(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        self.lookup(&self.id_tokens, token)
    }

    async fn verify_session_cookie(&self, cookie: &str) -> Result<AuthenticatedUser, AuthError> {
        self.lookup(&self.session_cookies, cookie)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::CredentialKind;

    #[tokio::test]
    async fn known_token_returns_user() {
        let validator = MockSessionValidator::new().with_test_user("t1", "alice");
        let user = validator.verify_id_token("t1").await.unwrap();
        assert_eq!(user.id.as_str(), "alice");
        assert_eq!(user.email.as_deref(), Some("alice@test.example.com"));
    }

    #[tokio::test]
    async fn unknown_token_is_invalid() {
        let validator = MockSessionValidator::new();
        assert!(matches!(
            validator.verify_id_token("nope").await,
            Err(AuthError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn id_tokens_are_not_accepted_as_cookies() {
        let validator = MockSessionValidator::new()
            .with_test_user("t1", "alice")
            .with_session_cookie("c1", "bob");

        assert!(validator.verify("t1", CredentialKind::SessionCookie).await.is_err());
        let user = validator.verify("c1", CredentialKind::SessionCookie).await.unwrap();
        assert_eq!(user.id.as_str(), "bob");
    }

    #[tokio::test]
    async fn forced_error_wins() {
        let validator = MockSessionValidator::new()
            .with_test_user("t1", "alice")
            .with_error(AuthError::TokenExpired);
        assert!(matches!(
            validator.verify_id_token("t1").await,
            Err(AuthError::TokenExpired)
        ));
    }
}
