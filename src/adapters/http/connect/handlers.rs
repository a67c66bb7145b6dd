//! HTTP handlers for creator Connect endpoints.
//!
//! The caller's uid is the creator id.

use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::adapters::http::error::ApiError;
use crate::adapters::http::middleware::RequireAuth;
use crate::adapters::http::state::AppState;
use crate::application::handlers::connect::CreateConnectedAccountCommand;
use crate::domain::foundation::{AuthenticatedUser, CreatorId};

use super::dto::{ConnectStatusResponse, ConnectedAccountResponse, OnboardingResponse};

fn creator_of(user: &AuthenticatedUser) -> Result<CreatorId, ApiError> {
    Ok(CreatorId::new(user.id.as_str())?)
}

/// GET /api/connect - Cached Connect state
pub async fn get_connected_account(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let account = state
        .get_connected_account_handler()
        .handle(&creator_of(&user)?)
        .await?;

    Ok(Json(ConnectStatusResponse {
        connected: account.is_some(),
        account: account.map(ConnectedAccountResponse::from),
    }))
}

/// POST /api/connect - Create (or resume) onboarding
pub async fn create_connected_account(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .create_connected_account_handler()
        .handle(CreateConnectedAccountCommand {
            creator_id: creator_of(&user)?,
            email: user.email.clone(),
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(OnboardingResponse {
            account: result.account.into(),
            onboarding_url: result.onboarding_url,
        }),
    ))
}

/// POST /api/connect/refresh - Re-read the account from Stripe
pub async fn refresh_connected_account(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let account = state
        .refresh_connected_account_handler()
        .handle(&creator_of(&user)?)
        .await?;

    Ok(Json(ConnectedAccountResponse::from(account)))
}
