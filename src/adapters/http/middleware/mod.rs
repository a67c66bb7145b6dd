//! HTTP middleware for axum.
//!
//! - `auth` - Authentication middleware and extractors

pub mod auth;

pub use auth::{
    auth_middleware, AdminAccess, AuthRejection, AuthState, OptionalAuth, RequireAdmin,
    RequireAuth, DEFAULT_SESSION_COOKIE,
};
