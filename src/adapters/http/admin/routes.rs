//! Axum router configuration for operator endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use crate::adapters::http::state::AppState;

use super::handlers::{
    backfill_access_grants, membership_report, prune_webhook_events, refund_purchase,
    resync_membership,
};

/// Create the admin router, mounted at `/api/admin`.
///
/// # Routes
/// - `GET /memberships/:uid` - Membership report
/// - `POST /memberships/:uid/resync` - Re-apply the Stripe subscription
/// - `POST /backfill/access-grants` - Create missing grants
/// - `POST /purchases/:id/refund` - Refund a purchase
/// - `POST /webhook-events/prune` - Delete old webhook events
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/memberships/:uid", get(membership_report))
        .route("/memberships/:uid/resync", post(resync_membership))
        .route("/backfill/access-grants", post(backfill_access_grants))
        .route("/purchases/:id/refund", post(refund_purchase))
        .route("/webhook-events/prune", post(prune_webhook_events))
}
