//! HTTP handlers for membership and usage endpoints.

use axum::extract::{Json, Path, State};
use axum::response::IntoResponse;

use crate::adapters::http::error::ApiError;
use crate::adapters::http::middleware::RequireAuth;
use crate::adapters::http::state::AppState;
use crate::application::handlers::membership::{
    CheckAndConsumeCommand, CreateBillingPortalCommand, CreateSubscriptionCheckoutCommand,
    EnsureMembershipCommand,
};
use crate::domain::membership::UsageCounter;

use super::dto::{CheckoutResponse, ConsumeResponse, MembershipResponse, PortalResponse};

/// GET /api/membership - Ensure and return the caller's membership
pub async fn get_membership(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let record = state
        .ensure_membership_handler()
        .handle(EnsureMembershipCommand {
            uid: user.id,
            email: user.email,
        })
        .await?;

    Ok(Json(MembershipResponse::from_record(
        &record,
        &state.settings.free_tier_limits,
    )))
}

/// POST /api/membership/checkout - Start a creator_pro subscription checkout
pub async fn create_checkout(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let session = state
        .subscription_checkout_handler()
        .handle(CreateSubscriptionCheckoutCommand {
            uid: user.id,
            email: user.email,
        })
        .await?;

    Ok(Json(CheckoutResponse::from(session)))
}

/// POST /api/membership/portal - Open the Stripe billing portal
pub async fn create_portal(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let session = state
        .billing_portal_handler()
        .handle(CreateBillingPortalCommand { uid: user.id })
        .await?;

    Ok(Json(PortalResponse::from(session)))
}

/// POST /api/usage/:counter/consume - Check and consume one unit of a quota
///
/// A denied consume is still a 200; `allowed` tells the caller.
pub async fn consume_usage(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(counter): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let counter: UsageCounter = counter.parse()?;
    let outcome = state
        .check_and_consume_handler()
        .handle(CheckAndConsumeCommand {
            uid: user.id,
            counter,
        })
        .await?;

    Ok(Json(ConsumeResponse::new(counter, outcome)))
}
