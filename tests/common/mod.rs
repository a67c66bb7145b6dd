//! Shared harness for HTTP integration tests.
//!
//! Builds the real router over in-memory stores and mock providers, then
//! drives it with `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use creator_vault::adapters::auth::MockSessionValidator;
use creator_vault::adapters::http::{build_router, AppState, AuthState, HttpSettings, RouterConfig};
use creator_vault::adapters::media::MockMediaStorage;
use creator_vault::adapters::memory::{
    InMemoryConnectedAccountStore, InMemoryEntitlementStore, InMemoryMembershipStore,
    InMemoryWebhookEventRepository,
};
use creator_vault::adapters::stripe::{MockPaymentProvider, MOCK_WEBHOOK_SECRET};
use creator_vault::application::handlers::connect::OnboardingUrls;
use creator_vault::application::handlers::membership::SubscriptionCheckoutSettings;
use creator_vault::domain::membership::FreeTierLimits;
use creator_vault::domain::payment::signature_header;

pub const ADMIN_UID: &str = "root";

pub struct TestApp {
    pub router: Router,
    pub memberships: Arc<InMemoryMembershipStore>,
    pub entitlements: Arc<InMemoryEntitlementStore>,
    pub accounts: Arc<InMemoryConnectedAccountStore>,
    pub webhook_events: Arc<InMemoryWebhookEventRepository>,
    pub payments: Arc<MockPaymentProvider>,
    pub media: Arc<MockMediaStorage>,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestApp {
    pub fn new() -> Self {
        let memberships = Arc::new(InMemoryMembershipStore::new());
        let entitlements = Arc::new(InMemoryEntitlementStore::new());
        let accounts = Arc::new(InMemoryConnectedAccountStore::new());
        let webhook_events = Arc::new(InMemoryWebhookEventRepository::new());
        let payments = Arc::new(MockPaymentProvider::new());
        let media = Arc::new(MockMediaStorage::new());

        let state = AppState {
            memberships: memberships.clone(),
            entitlements: entitlements.clone(),
            accounts: accounts.clone(),
            webhook_events: webhook_events.clone(),
            payment_provider: payments.clone(),
            media_storage: media.clone(),
            settings: Arc::new(HttpSettings {
                free_tier_limits: FreeTierLimits::default(),
                checkout: SubscriptionCheckoutSettings {
                    price_id: "price_creator_pro".to_string(),
                    success_url: "https://app.test/billing/success".to_string(),
                    cancel_url: "https://app.test/billing".to_string(),
                    portal_return_url: "https://app.test/account".to_string(),
                },
                onboarding: OnboardingUrls {
                    refresh_url: "https://app.test/connect/refresh".to_string(),
                    return_url: "https://app.test/connect/done".to_string(),
                },
                upload_url_ttl: Duration::from_secs(900),
                allowed_upload_types: vec!["image/*".to_string(), "application/pdf".to_string()],
                webhook_timeout: Duration::from_secs(5),
            }),
        };

        let validator = MockSessionValidator::new()
            .with_test_user("alice-token", "alice")
            .with_test_user("bob-token", "bob")
            .with_test_user("carol-token", "carol")
            .with_test_user("root-token", ADMIN_UID)
            .with_session_cookie("alice-cookie", "alice");
        let auth = AuthState::new(Arc::new(validator)).with_admin_uids([ADMIN_UID]);

        Self {
            router: build_router(state, auth, &RouterConfig::default()),
            memberships,
            entitlements,
            accounts,
            webhook_events,
            payments,
            media,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        TestResponse { status, body }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.send(request(Method::GET, uri, token, None)).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Option<Value>) -> TestResponse {
        self.send(request(Method::POST, uri, token, body)).await
    }

    /// Delivers a webhook signed with the mock provider's secret.
    pub async fn deliver(&self, event: &Value) -> TestResponse {
        let payload = serde_json::to_vec(event).unwrap();
        let signature = signature_header(MOCK_WEBHOOK_SECRET, chrono::Utc::now().timestamp(), &payload);
        self.deliver_raw(payload, &signature).await
    }

    pub async fn deliver_raw(&self, payload: Vec<u8>, signature: &str) -> TestResponse {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/webhook")
            .header("content-type", "application/json")
            .header("Stripe-Signature", signature)
            .body(Body::from(payload))
            .unwrap();
        self.send(request).await
    }
}

pub fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub fn event(id: &str, event_type: &str, object: Value) -> Value {
    json!({
        "id": id,
        "type": event_type,
        "created": chrono::Utc::now().timestamp(),
        "livemode": false,
        "data": { "object": object }
    })
}

/// bob buys box_1 for $29.99 in checkout session cs_123.
pub fn bundle_checkout(event_id: &str) -> Value {
    event(
        event_id,
        "checkout.session.completed",
        json!({
            "id": "cs_123",
            "object": "checkout.session",
            "mode": "payment",
            "payment_status": "paid",
            "client_reference_id": "bob",
            "amount_total": 2999,
            "currency": "usd",
            "payment_intent": "pi_123",
            "metadata": { "productBoxId": "box_1", "creatorId": "carol" }
        }),
    )
}

pub fn subscription_event(event_id: &str, event_type: &str, status: &str, uid: &str) -> Value {
    event(
        event_id,
        event_type,
        json!({
            "id": "sub_1",
            "object": "subscription",
            "customer": "cus_1",
            "status": status,
            "current_period_end": 1_767_225_600,
            "cancel_at_period_end": false,
            "metadata": { "uid": uid }
        }),
    )
}
