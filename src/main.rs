use std::sync::Arc;

use anyhow::Context;
use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use creator_vault::adapters::auth::{FirebaseConfig, FirebaseSessionValidator};
use creator_vault::adapters::http::{build_router, AppState, AuthState, HttpSettings, RouterConfig};
use creator_vault::adapters::media::{R2Config, R2MediaStorage};
use creator_vault::adapters::postgres::{
    run_migrations, PostgresConnectedAccountStore, PostgresEntitlementStore,
    PostgresMembershipStore, PostgresWebhookEventRepository,
};
use creator_vault::adapters::stripe::{StripeConfig, StripePaymentAdapter};
use creator_vault::application::handlers::connect::OnboardingUrls;
use creator_vault::application::handlers::membership::SubscriptionCheckoutSettings;
use creator_vault::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    init_tracing(&config);
    config.validate().context("Invalid configuration")?;

    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .idle_timeout(config.database.idle_timeout())
        .max_lifetime(config.database.max_lifetime())
        .connect(config.database.url.expose_secret())
        .await
        .context("Failed to connect to PostgreSQL")?;

    if config.database.run_migrations {
        run_migrations(&pool).await?;
        info!("Database migrations applied");
    }

    let payment = &config.payment;
    let stripe = StripePaymentAdapter::new(
        StripeConfig::new(
            payment.stripe_api_key.clone(),
            payment.stripe_webhook_secret.clone(),
        )
        .with_require_livemode(payment.require_livemode)
        .with_request_timeout(payment.api_timeout()),
    );

    let storage = &config.storage;
    let media = R2MediaStorage::new(R2Config {
        endpoint: storage.endpoint.clone(),
        bucket: storage.bucket.clone(),
        access_key_id: storage.access_key_id.clone(),
        secret_access_key: storage.secret_access_key.clone(),
        region: storage.region.clone(),
        public_base_url: storage.public_base_url.clone(),
    })
    .await?;

    let validator = FirebaseSessionValidator::new(
        FirebaseConfig::new(config.auth.firebase_project_id.clone())
            .with_cache_duration(config.auth.jwks_cache_ttl()),
    );

    let state = AppState {
        memberships: Arc::new(PostgresMembershipStore::new(pool.clone())),
        entitlements: Arc::new(PostgresEntitlementStore::new(pool.clone())),
        accounts: Arc::new(PostgresConnectedAccountStore::new(pool.clone())),
        webhook_events: Arc::new(PostgresWebhookEventRepository::new(pool.clone())),
        payment_provider: Arc::new(stripe),
        media_storage: Arc::new(media),
        settings: Arc::new(HttpSettings {
            free_tier_limits: config.limits.free_tier(),
            checkout: SubscriptionCheckoutSettings {
                price_id: payment.creator_pro_price_id.clone(),
                success_url: payment.checkout_success_url.clone(),
                cancel_url: payment.checkout_cancel_url.clone(),
                portal_return_url: payment.portal_return_url.clone(),
            },
            onboarding: OnboardingUrls {
                refresh_url: payment.connect_refresh_url.clone(),
                return_url: payment.connect_return_url.clone(),
            },
            upload_url_ttl: storage.upload_url_ttl(),
            allowed_upload_types: storage.allowed_content_type_list(),
            webhook_timeout: payment.webhook_timeout(),
        }),
    };

    let auth = AuthState::new(Arc::new(validator))
        .with_cookie_name(config.auth.session_cookie_name.clone())
        .with_admin_uids(config.auth.admin_uid_list());

    let router_config = RouterConfig {
        request_timeout: config.server.request_timeout(),
        body_limit_bytes: config.server.body_limit_bytes,
        cors_origins: config.server.cors_origins_list(),
    };
    let app = build_router(state, auth, &router_config);

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!(%addr, environment = ?config.server.environment, "Server is running");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    info!("Server stopped");
    Ok(())
}

/// JSON logs in production, human-readable otherwise. `RUST_LOG` wins
/// over the configured filter.
fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    if config.is_production() {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().pretty()).init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C signal"),
        _ = terminate => info!("Received terminate signal"),
    }
}
