//! Axum router configuration for media endpoints.

use axum::{routing::post, Router};

use crate::adapters::http::state::AppState;

use super::handlers::create_upload_url;

/// Create the media router, mounted at `/api/media`.
pub fn media_routes() -> Router<AppState> {
    Router::new().route("/upload-url", post(create_upload_url))
}
