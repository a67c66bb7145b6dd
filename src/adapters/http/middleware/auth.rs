//! Authentication middleware and extractors for axum.
//!
//! This module provides:
//! - `auth_middleware` - Layer that verifies the caller's credential and injects the user into extensions
//! - `RequireAuth` - Extractor that requires authentication
//! - `RequireAdmin` - Extractor that requires an operator uid
//! - `OptionalAuth` - Extractor for optional authentication
//!
//! # Architecture
//!
//! The middleware uses the `SessionValidator` port, so Firebase in
//! production and the mock in tests go through the same code.
//!
//! ```text
//! Request → auth_middleware → injects AuthenticatedUser (and AdminAccess) into extensions
//!                                      ↓
//!                              Handler → RequireAuth extractor reads from extensions
//! ```
//!
//! # Credentials
//!
//! `Authorization: Bearer <id token>` is checked first, then the session
//! cookie. A request carrying neither passes through unauthenticated; a
//! request carrying a bad one is rejected here with 401.

use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::CookieJar;

use crate::domain::foundation::{AuthError, AuthenticatedUser, CredentialKind};
use crate::ports::SessionValidator;

/// Default Firebase Hosting session cookie name.
pub const DEFAULT_SESSION_COOKIE: &str = "__session";

/// Auth middleware state.
#[derive(Clone)]
pub struct AuthState {
    validator: Arc<dyn SessionValidator>,
    cookie_name: Arc<str>,
    admin_uids: Arc<HashSet<String>>,
}

impl AuthState {
    pub fn new(validator: Arc<dyn SessionValidator>) -> Self {
        Self {
            validator,
            cookie_name: Arc::from(DEFAULT_SESSION_COOKIE),
            admin_uids: Arc::new(HashSet::new()),
        }
    }

    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = Arc::from(name.into());
        self
    }

    pub fn with_admin_uids<I, S>(mut self, uids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.admin_uids = Arc::new(uids.into_iter().map(Into::into).collect());
        self
    }

    fn is_admin(&self, user: &AuthenticatedUser) -> bool {
        self.admin_uids.contains(user.id.as_str())
    }
}

/// Marker placed in request extensions for operator callers.
#[derive(Debug, Clone, Copy)]
pub struct AdminAccess;

/// Picks the credential to verify: bearer token first, then the cookie.
fn credential_from(headers: &HeaderMap, cookie_name: &str) -> Option<(String, CredentialKind)> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some((token.to_string(), CredentialKind::IdToken));
    }

    CookieJar::from_headers(headers)
        .get(cookie_name)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
        .map(|v| (v, CredentialKind::SessionCookie))
}

/// Authentication middleware.
///
/// This middleware:
/// 1. Extracts the credential (bearer token, else session cookie)
/// 2. Verifies it using the `SessionValidator` port
/// 3. On success, injects `AuthenticatedUser` into request extensions
/// 4. On missing credential, continues without injecting
/// 5. On invalid credential, returns 401 Unauthorized
pub async fn auth_middleware(
    State(auth): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some((credential, kind)) = credential_from(request.headers(), &auth.cookie_name) else {
        return next.run(request).await;
    };

    match auth.validator.verify(&credential, kind).await {
        Ok(user) => {
            if auth.is_admin(&user) {
                request.extensions_mut().insert(AdminAccess);
            }
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => {
            let (status, message) = match &e {
                AuthError::TokenExpired => (StatusCode::UNAUTHORIZED, "Token expired"),
                AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid token"),
                AuthError::ServiceUnavailable(msg) => {
                    tracing::error!("Auth service unavailable: {}", msg);
                    (
                        StatusCode::SERVICE_UNAVAILABLE,
                        "Authentication service unavailable",
                    )
                }
                AuthError::InsufficientPermissions => {
                    (StatusCode::UNAUTHORIZED, "Authentication failed")
                }
            };
            tracing::debug!(?kind, error = %e, "Credential rejected");

            (
                status,
                Json(serde_json::json!({
                    "errorCode": "UNAUTHENTICATED",
                    "message": message
                })),
            )
                .into_response()
        }
    }
}

/// Extractor that requires authentication.
///
/// If no user is in the request extensions (no credential was sent),
/// returns 401 Unauthorized.
///
/// # Example
///
/// ```ignore
/// async fn my_handler(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", user.id)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequireAuth(pub AuthenticatedUser);

impl<S> axum::extract::FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut axum::http::request::Parts,
        _state: &'life1 S,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            parts
                .extensions
                .get::<AuthenticatedUser>()
                .cloned()
                .map(RequireAuth)
                .ok_or(AuthRejection::Unauthenticated)
        })
    }
}

/// Extractor for operator-only routes.
///
/// 401 without a user, 403 for a user whose uid is not configured as admin.
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub AuthenticatedUser);

impl<S> axum::extract::FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut axum::http::request::Parts,
        _state: &'life1 S,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            let user = parts
                .extensions
                .get::<AuthenticatedUser>()
                .cloned()
                .ok_or(AuthRejection::Unauthenticated)?;
            if parts.extensions.get::<AdminAccess>().is_none() {
                tracing::warn!(uid = %user.id, "Non-admin caller on admin route");
                return Err(AuthRejection::Forbidden);
            }
            Ok(RequireAdmin(user))
        })
    }
}

/// Extractor for optional authentication.
///
/// Returns `None` if no valid credential was provided.
#[derive(Debug, Clone)]
pub struct OptionalAuth(pub Option<AuthenticatedUser>);

impl<S> axum::extract::FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut axum::http::request::Parts,
        _state: &'life1 S,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            let user = parts.extensions.get::<AuthenticatedUser>().cloned();
            Ok(OptionalAuth(user))
        })
    }
}

/// Rejection type for authentication failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthRejection {
    /// No valid credential was provided.
    Unauthenticated,
    /// Authenticated, but not an operator.
    Forbidden,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AuthRejection::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHENTICATED",
                "Authentication required",
            ),
            AuthRejection::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN", "Admin access required"),
        };

        (
            status,
            Json(serde_json::json!({
                "errorCode": code,
                "message": message
            })),
        )
            .into_response()
    }
}
