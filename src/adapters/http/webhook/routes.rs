//! Axum router configuration for the Stripe webhook.

use axum::{routing::post, Router};

use crate::adapters::http::state::AppState;

use super::handlers::handle_stripe_webhook;

/// Create the webhook router, mounted at the root.
///
/// Kept outside `/api` because it carries no user credential; the
/// signature is its authentication.
pub fn webhook_routes() -> Router<AppState> {
    Router::new().route("/webhook", post(handle_stripe_webhook))
}
