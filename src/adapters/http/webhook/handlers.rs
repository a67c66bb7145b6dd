//! HTTP handler for Stripe webhook deliveries.
//!
//! The raw body is passed through untouched; signature verification needs
//! the exact bytes Stripe signed. A 2xx is returned only once every side
//! effect has committed, so Stripe keeps redelivering until then.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::adapters::http::error::{status_for, ErrorResponse};
use crate::adapters::http::state::AppState;
use crate::application::handlers::webhook::{ReconcileWebhookCommand, ReconcileWebhookResult};
use crate::domain::foundation::{DomainError, ErrorCode};

pub const SIGNATURE_HEADER: &str = "Stripe-Signature";

/// Acknowledgement body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookAck {
    pub received: bool,
    pub duplicate: bool,
}

/// Webhook errors never carry detail back to the sender.
pub struct WebhookApiError(DomainError);

impl IntoResponse for WebhookApiError {
    fn into_response(self) -> Response {
        let status = status_for(self.0.code);
        if status.is_server_error() {
            tracing::error!(code = %self.0.code, error = %self.0.message, "Webhook processing failed");
        }
        let message = if self.0.code == ErrorCode::InvalidSignature {
            "Webhook verification failed"
        } else {
            "Webhook processing failed"
        };
        (status, Json(ErrorResponse::new(self.0.code.to_string(), message))).into_response()
    }
}

/// POST /webhook - Stripe callback
pub async fn handle_stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, WebhookApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            tracing::warn!("Webhook delivery without signature header");
            WebhookApiError(DomainError::new(
                ErrorCode::InvalidSignature,
                "Missing Stripe-Signature header",
            ))
        })?;

    let result = state
        .webhook_handler()
        .handle(ReconcileWebhookCommand {
            payload: body.to_vec(),
            signature: signature.to_string(),
        })
        .await
        .map_err(WebhookApiError)?;

    let duplicate = matches!(result, ReconcileWebhookResult::AlreadyRecorded { .. });
    Ok((
        StatusCode::OK,
        Json(WebhookAck {
            received: true,
            duplicate,
        }),
    ))
}
