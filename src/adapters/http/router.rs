//! Top-level router: feature routers, auth and the tower-http stack.

use std::time::Duration;

use axum::{
    body::Body,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method, Request, StatusCode,
    },
    middleware,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use super::admin::admin_routes;
use super::connect::connect_routes;
use super::error::ErrorResponse;
use super::media::media_routes;
use super::membership::{membership_routes, usage_routes};
use super::middleware::{auth_middleware, AuthState};
use super::purchases::purchase_routes;
use super::state::AppState;
use super::webhook::webhook_routes;

/// Transport limits for the router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    pub request_timeout: Duration,
    pub body_limit_bytes: usize,
    /// Origins allowed to call the API with credentials. Empty disables CORS.
    pub cors_origins: Vec<String>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            body_limit_bytes: 1024 * 1024,
            cors_origins: Vec::new(),
        }
    }
}

/// Routes that sit behind `auth_middleware`.
fn api_routes(auth: AuthState) -> Router<AppState> {
    Router::new()
        .nest("/membership", membership_routes())
        .nest("/usage", usage_routes())
        .merge(purchase_routes())
        .nest("/connect", connect_routes())
        .nest("/media", media_routes())
        .nest("/admin", admin_routes())
        .layer(middleware::from_fn_with_state(auth, auth_middleware))
}

/// Builds the full application router.
///
/// ```text
/// GET  /health
/// POST /webhook
///      /api/...   (credential checked by auth_middleware)
/// ```
pub fn build_router(state: AppState, auth: AuthState, config: &RouterConfig) -> Router {
    let mut router = Router::new()
        .route("/health", get(health_check))
        .merge(webhook_routes())
        .nest("/api", api_routes(auth))
        .fallback(not_found)
        .with_state(state)
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(RequestBodyLimitLayer::new(config.body_limit_bytes));

    if let Some(cors) = cors_layer(&config.cors_origins) {
        router = router.layer(cors);
    }

    router
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("-");
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri().path(),
                    request_id = %request_id,
                )
            }),
        )
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    if origins.is_empty() {
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([AUTHORIZATION, CONTENT_TYPE])
            .allow_credentials(true)
            .allow_origin(AllowOrigin::list(origins)),
    )
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::new("NOT_FOUND", "No such route")),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_origin_list_disables_cors() {
        assert!(cors_layer(&[]).is_none());
        assert!(cors_layer(&["https://app.example.com".to_string()]).is_some());
    }

    #[test]
    fn default_limits() {
        let config = RouterConfig::default();
        assert_eq!(config.body_limit_bytes, 1024 * 1024);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }
}
