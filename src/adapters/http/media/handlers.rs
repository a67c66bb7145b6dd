//! HTTP handlers for media uploads.

use axum::extract::{Json, State};
use axum::response::IntoResponse;

use crate::adapters::http::error::ApiError;
use crate::adapters::http::middleware::RequireAuth;
use crate::adapters::http::state::AppState;
use crate::application::handlers::media::PresignUploadCommand;

use super::dto::{UploadUrlRequest, UploadUrlResponse};

/// POST /api/media/upload-url - Presign an upload under the caller's prefix
pub async fn create_upload_url(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(request): Json<UploadUrlRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .presign_upload_handler()
        .handle(PresignUploadCommand {
            uid: user.id,
            file_name: request.file_name,
            content_type: request.content_type,
        })
        .await?;

    Ok(Json(UploadUrlResponse::from(result)))
}
