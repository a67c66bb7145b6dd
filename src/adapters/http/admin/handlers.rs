//! HTTP handlers for operator endpoints.
//!
//! Every handler takes `RequireAdmin`; the acting uid is logged.

use axum::extract::{Json, Path, State};
use axum::response::IntoResponse;

use crate::adapters::http::error::ApiError;
use crate::adapters::http::middleware::RequireAdmin;
use crate::adapters::http::state::AppState;
use crate::domain::foundation::{PurchaseId, UserId};

use super::dto::{
    BackfillResponse, PruneRequest, PruneResponse, RefundResponse, ResyncResponse,
};

/// GET /api/admin/memberships/:uid - Membership report
pub async fn membership_report(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(uid): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let uid = UserId::new(uid)?;
    tracing::info!(admin = %admin.id, uid = %uid, "Membership report requested");

    let report = state.membership_report_handler().handle(&uid).await;
    Ok(Json(report))
}

/// POST /api/admin/memberships/:uid/resync - Re-apply the Stripe subscription
pub async fn resync_membership(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(uid): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let uid = UserId::new(uid)?;
    tracing::info!(admin = %admin.id, uid = %uid, "Membership resync requested");

    let result = state.resync_membership_handler().handle(&uid).await?;
    Ok(Json(ResyncResponse::new(result.applied, result.membership)))
}

/// POST /api/admin/backfill/access-grants - Create missing grants
pub async fn backfill_access_grants(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!(admin = %admin.id, "Access grant backfill requested");

    let grants_created = state.backfill_access_grants_handler().handle().await?;
    Ok(Json(BackfillResponse { grants_created }))
}

/// POST /api/admin/purchases/:id/refund - Refund through Stripe
pub async fn refund_purchase(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let purchase_id = PurchaseId::new(id)?;
    tracing::info!(admin = %admin.id, purchase_id = %purchase_id, "Refund requested");

    let receipt = state.refund_purchase_handler().handle(&purchase_id).await?;
    Ok(Json(RefundResponse::from(receipt)))
}

/// POST /api/admin/webhook-events/prune - Delete old finished events
pub async fn prune_webhook_events(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(request): Json<PruneRequest>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!(
        admin = %admin.id,
        older_than_days = request.older_than_days,
        "Webhook event prune requested"
    );

    let deleted = state
        .prune_webhook_events_handler()
        .handle(request.older_than_days)
        .await?;
    Ok(Json(PruneResponse { deleted }))
}
