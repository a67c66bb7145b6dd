//! HTTP handlers for purchase and access endpoints.
//!
//! Read-only. Purchases are only ever written by the webhook reconciler.

use axum::extract::{Json, Path, State};
use axum::response::IntoResponse;

use crate::adapters::http::error::ApiError;
use crate::adapters::http::middleware::RequireAuth;
use crate::adapters::http::state::AppState;
use crate::application::handlers::purchase::{CheckAccessQuery, GetPurchaseQuery, ListPurchasesQuery};
use crate::domain::foundation::{ProductBoxId, PurchaseId};

use super::dto::{AccessResponse, PurchaseListResponse, PurchaseResponse};

/// GET /api/purchases - List the caller's purchases
pub async fn list_purchases(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let purchases = state
        .list_purchases_handler()
        .handle(ListPurchasesQuery { uid: user.id })
        .await?;

    Ok(Json(PurchaseListResponse {
        purchases: purchases.into_iter().map(PurchaseResponse::from).collect(),
    }))
}

/// GET /api/purchases/:id - One of the caller's purchases
pub async fn get_purchase(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let purchase = state
        .get_purchase_handler()
        .handle(GetPurchaseQuery {
            uid: user.id,
            purchase_id: PurchaseId::new(id)?,
        })
        .await?;

    Ok(Json(PurchaseResponse::from(purchase)))
}

/// GET /api/access/:product_box_id - Whether the caller may open a bundle
pub async fn check_access(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(product_box_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let product_box_id = ProductBoxId::new(product_box_id)?;
    let result = state
        .check_access_handler()
        .handle(CheckAccessQuery {
            uid: user.id,
            product_box_id: product_box_id.clone(),
        })
        .await?;

    Ok(Json(AccessResponse::new(product_box_id.into_inner(), result)))
}
