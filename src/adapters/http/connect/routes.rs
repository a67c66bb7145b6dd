//! Axum router configuration for creator Connect endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use crate::adapters::http::state::AppState;

use super::handlers::{create_connected_account, get_connected_account, refresh_connected_account};

/// Create the Connect router, mounted at `/api/connect`.
///
/// # Routes
/// - `GET /` - Cached account state
/// - `POST /` - Create or resume onboarding
/// - `POST /refresh` - Refresh from Stripe
pub fn connect_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get_connected_account).post(create_connected_account))
        .route("/refresh", post(refresh_connected_account))
}
