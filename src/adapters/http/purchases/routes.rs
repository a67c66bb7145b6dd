//! Axum router configuration for purchase and access endpoints.

use axum::{routing::get, Router};

use crate::adapters::http::state::AppState;

use super::handlers::{check_access, get_purchase, list_purchases};

/// Create the purchases router, mounted at `/api`.
///
/// # Routes
/// - `GET /purchases` - List the caller's purchases
/// - `GET /purchases/:id` - One purchase
/// - `GET /access/:product_box_id` - Access check for a bundle
pub fn purchase_routes() -> Router<AppState> {
    Router::new()
        .route("/purchases", get(list_purchases))
        .route("/purchases/:id", get(get_purchase))
        .route("/access/:product_box_id", get(check_access))
}
