//! Axum router configuration for membership and usage endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use crate::adapters::http::state::AppState;

use super::handlers::{consume_usage, create_checkout, create_portal, get_membership};

/// Create the membership router, mounted at `/api/membership`.
///
/// # Routes
/// - `GET /` - Ensure and return the caller's membership
/// - `POST /checkout` - Start a creator_pro subscription checkout
/// - `POST /portal` - Open the billing portal
pub fn membership_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get_membership))
        .route("/checkout", post(create_checkout))
        .route("/portal", post(create_portal))
}

/// Create the usage router, mounted at `/api/usage`.
///
/// # Routes
/// - `POST /:counter/consume` - Check and consume one unit
pub fn usage_routes() -> Router<AppState> {
    Router::new().route("/:counter/consume", post(consume_usage))
}
