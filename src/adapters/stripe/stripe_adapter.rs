//! Stripe payment provider adapter.
//!
//! Implements the `PaymentProvider` port against the Stripe REST API.
//! Handles webhook verification, creator_pro checkout and portal sessions,
//! subscription lookups, Connect accounts and refunds.
//!
//! # Security
//!
//! - HMAC-SHA256 signature verification with constant-time comparison
//! - Timestamp validation (5-minute window) for replay attack prevention
//! - Secrets handled via `secrecy::SecretString`
//!
//! # Configuration
//!
//! ```ignore
//! let config = StripeConfig::new(api_key, webhook_secret);
//! let adapter = StripePaymentAdapter::new(config);
//! ```

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::domain::foundation::CreatorId;
use crate::domain::payment::{AccountSnapshot, SubscriptionSnapshot, VerifiedEvent, WebhookError, WebhookVerifier};
use crate::ports::{
    CheckoutSession, PaymentError, PaymentErrorCode, PaymentProvider, PortalSession,
    RefundReceipt, SubscriptionCheckoutRequest,
};

use super::webhook_types::{
    verify_and_decode, StripeAccount, StripeAccountLink, StripeCheckoutSession,
    StripeErrorResponse, StripeRefund, StripeSubscription,
};

/// Stripe API configuration.
#[derive(Clone)]
pub struct StripeConfig {
    /// Stripe secret API key (sk_live_... or sk_test_...).
    api_key: SecretString,

    /// Webhook signing secret (whsec_...).
    webhook_secret: SecretString,

    /// Base URL for Stripe API (default: https://api.stripe.com).
    api_base_url: String,

    /// Reject test-mode events.
    require_livemode: bool,

    request_timeout: Duration,
}

impl StripeConfig {
    pub fn new(api_key: SecretString, webhook_secret: SecretString) -> Self {
        Self {
            api_key,
            webhook_secret,
            api_base_url: "https://api.stripe.com".to_string(),
            require_livemode: false,
            request_timeout: Duration::from_secs(10),
        }
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    pub fn with_require_livemode(mut self, require: bool) -> Self {
        self.require_livemode = require;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

impl std::fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeConfig")
            .field("api_key", &"[REDACTED]")
            .field("webhook_secret", &"[REDACTED]")
            .field("api_base_url", &self.api_base_url)
            .field("require_livemode", &self.require_livemode)
            .finish()
    }
}

/// Stripe payment provider adapter.
pub struct StripePaymentAdapter {
    config: StripeConfig,
    verifier: WebhookVerifier,
    http_client: reqwest::Client,
}

impl StripePaymentAdapter {
    pub fn new(config: StripeConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            verifier: WebhookVerifier::new(config.webhook_secret.clone()),
            config,
            http_client,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base_url.trim_end_matches('/'), path)
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.http_client
            .post(self.url(path))
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.http_client
            .get(self.url(path))
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
    }

    /// Sends a request and decodes the body. 404 becomes `Ok(None)`.
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<Option<T>, PaymentError> {
        let response = request
            .send()
            .await
            .map_err(|e| PaymentError::network(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(api_error(status, &error_text));
        }

        response.json::<T>().await.map(Some).map_err(|e| {
            PaymentError::new(
                PaymentErrorCode::ProviderError,
                format!("Failed to parse Stripe response: {}", e),
            )
        })
    }

    /// Like `send`, but a missing resource is an error.
    async fn send_required<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        resource: &str,
    ) -> Result<T, PaymentError> {
        self.send(request)
            .await?
            .ok_or_else(|| PaymentError::not_found(resource))
    }
}

/// Maps a non-success Stripe response to a `PaymentError`.
fn api_error(status: reqwest::StatusCode, body: &str) -> PaymentError {
    let code = match status.as_u16() {
        400 | 402 => PaymentErrorCode::InvalidRequest,
        401 | 403 => PaymentErrorCode::AuthenticationError,
        429 => PaymentErrorCode::RateLimitExceeded,
        _ => PaymentErrorCode::ProviderError,
    };

    match serde_json::from_str::<StripeErrorResponse>(body) {
        Ok(parsed) => {
            let message = parsed
                .error
                .message
                .unwrap_or_else(|| format!("Stripe API error ({})", status));
            let error = PaymentError::new(code, format!("Stripe API error: {}", message));
            match parsed.error.code.or(parsed.error.error_type) {
                Some(provider_code) => error.with_provider_code(provider_code),
                None => error,
            }
        }
        Err(_) => PaymentError::new(code, format!("Stripe API error ({})", status)),
    }
}

#[async_trait]
impl PaymentProvider for StripePaymentAdapter {
    async fn verify_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<VerifiedEvent, WebhookError> {
        let now = chrono::Utc::now().timestamp();
        let event = verify_and_decode(
            &self.verifier,
            payload,
            signature,
            now,
            self.config.require_livemode,
        )
        .map_err(|e| {
            tracing::warn!(error = %e, "Rejected webhook delivery");
            e
        })?;

        tracing::debug!(
            event_id = %event.id(),
            event_type = event.event_type(),
            "Webhook signature verified"
        );
        Ok(event)
    }

    async fn create_subscription_checkout(
        &self,
        request: SubscriptionCheckoutRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        let uid = request.uid.to_string();
        let mut params = vec![
            ("mode", "subscription".to_string()),
            ("line_items[0][price]", request.price_id),
            ("line_items[0][quantity]", "1".to_string()),
            ("success_url", request.success_url),
            ("cancel_url", request.cancel_url),
            ("client_reference_id", uid.clone()),
            ("metadata[uid]", uid.clone()),
            ("subscription_data[metadata][uid]", uid),
        ];

        match (request.customer_id, request.email) {
            (Some(customer_id), _) => params.push(("customer", customer_id)),
            (None, Some(email)) => params.push(("customer_email", email)),
            (None, None) => {}
        }

        let session: StripeCheckoutSession = self
            .send_required(self.post("/v1/checkout/sessions").form(&params), "checkout session")
            .await?;

        let url = session
            .url
            .unwrap_or_else(|| format!("https://checkout.stripe.com/c/pay/{}", session.id));

        Ok(CheckoutSession { id: session.id, url })
    }

    async fn create_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> Result<PortalSession, PaymentError> {
        #[derive(Deserialize)]
        struct PortalSessionResponse {
            id: String,
            url: String,
        }

        let portal: PortalSessionResponse = self
            .send_required(
                self.post("/v1/billing_portal/sessions")
                    .form(&[("customer", customer_id), ("return_url", return_url)]),
                "customer",
            )
            .await?;

        Ok(PortalSession {
            id: portal.id,
            url: portal.url,
        })
    }

    async fn retrieve_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Option<SubscriptionSnapshot>, PaymentError> {
        let sub: Option<StripeSubscription> = self
            .send(self.get(&format!("/v1/subscriptions/{}", subscription_id)))
            .await?;
        Ok(sub.map(StripeSubscription::into_domain))
    }

    async fn create_connected_account(
        &self,
        creator_id: &CreatorId,
        email: Option<&str>,
    ) -> Result<AccountSnapshot, PaymentError> {
        let mut params = vec![
            ("type", "express".to_string()),
            ("metadata[creatorId]", creator_id.to_string()),
            ("capabilities[card_payments][requested]", "true".to_string()),
            ("capabilities[transfers][requested]", "true".to_string()),
        ];
        if let Some(email) = email {
            params.push(("email", email.to_string()));
        }

        let account: StripeAccount = self
            .send_required(self.post("/v1/accounts").form(&params), "account")
            .await?;
        Ok(account.into_domain())
    }

    async fn create_account_link(
        &self,
        account_id: &str,
        refresh_url: &str,
        return_url: &str,
    ) -> Result<String, PaymentError> {
        let link: StripeAccountLink = self
            .send_required(
                self.post("/v1/account_links").form(&[
                    ("account", account_id),
                    ("refresh_url", refresh_url),
                    ("return_url", return_url),
                    ("type", "account_onboarding"),
                ]),
                "account",
            )
            .await?;
        Ok(link.url)
    }

    async fn retrieve_account(
        &self,
        account_id: &str,
    ) -> Result<Option<AccountSnapshot>, PaymentError> {
        let account: Option<StripeAccount> = self
            .send(self.get(&format!("/v1/accounts/{}", account_id)))
            .await?;
        Ok(account.map(StripeAccount::into_domain))
    }

    async fn refund_payment(
        &self,
        payment_intent_id: &str,
        idempotency_key: &str,
    ) -> Result<RefundReceipt, PaymentError> {
        let refund: StripeRefund = self
            .send_required(
                self.post("/v1/refunds")
                    .header("Idempotency-Key", idempotency_key)
                    .form(&[("payment_intent", payment_intent_id)]),
                "payment intent",
            )
            .await?;

        Ok(RefundReceipt {
            refund_id: refund.id,
            status: refund.status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payment::{signature_header, PaymentEvent};

    const SECRET: &str = "whsec_test_secret";

    fn test_config() -> StripeConfig {
        StripeConfig::new(
            SecretString::new("sk_test_key".to_string()),
            SecretString::new(SECRET.to_string()),
        )
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Configuration Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn config_new_sets_defaults() {
        let config = test_config();
        assert_eq!(config.api_base_url, "https://api.stripe.com");
        assert!(!config.require_livemode);
    }

    #[test]
    fn config_with_base_url() {
        let config = test_config().with_base_url("http://localhost:12111/");
        let adapter = StripePaymentAdapter::new(config);
        assert_eq!(adapter.url("/v1/refunds"), "http://localhost:12111/v1/refunds");
    }

    #[test]
    fn config_debug_redacts_secrets() {
        let debug = format!("{:?}", test_config());
        assert!(!debug.contains("sk_test_key"));
        assert!(!debug.contains(SECRET));
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Error Mapping Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn api_error_extracts_provider_code() {
        let body = r#"{"error":{"code":"resource_missing","message":"No such customer","type":"invalid_request_error"}}"#;
        let err = api_error(reqwest::StatusCode::BAD_REQUEST, body);
        assert_eq!(err.code, PaymentErrorCode::InvalidRequest);
        assert_eq!(err.provider_code.as_deref(), Some("resource_missing"));
        assert!(err.message.contains("No such customer"));
        assert!(!err.retryable);
    }

    #[test]
    fn rate_limits_are_retryable() {
        let err = api_error(reqwest::StatusCode::TOO_MANY_REQUESTS, "");
        assert_eq!(err.code, PaymentErrorCode::RateLimitExceeded);
        assert!(err.retryable);
    }

    #[test]
    fn server_errors_are_provider_errors() {
        let err = api_error(reqwest::StatusCode::BAD_GATEWAY, "<html>");
        assert_eq!(err.code, PaymentErrorCode::ProviderError);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Webhook Verification Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn verify_webhook_valid_signature_and_payload() {
        let adapter = StripePaymentAdapter::new(test_config());
        let payload = br#"{
            "id": "evt_test123",
            "type": "customer.subscription.deleted",
            "created": 1704067200,
            "data": { "object": { "id": "sub_1", "customer": "cus_1", "status": "canceled" } },
            "livemode": false
        }"#;
        let header = signature_header(SECRET, chrono::Utc::now().timestamp(), payload);

        let event = adapter.verify_webhook(payload, &header).await.unwrap();
        assert_eq!(event.id().as_str(), "evt_test123");
        assert!(matches!(event.event(), PaymentEvent::SubscriptionDeleted(_)));
    }

    #[tokio::test]
    async fn verify_webhook_rejects_expired_signature() {
        let adapter = StripePaymentAdapter::new(test_config());
        let payload = br#"{"id":"evt_test"}"#;
        let header = signature_header(SECRET, chrono::Utc::now().timestamp() - 600, payload);

        let err = adapter.verify_webhook(payload, &header).await.unwrap_err();
        assert_eq!(err, WebhookError::TimestampOutOfRange);
    }

    #[tokio::test]
    async fn verify_webhook_rejects_malformed_header() {
        let adapter = StripePaymentAdapter::new(test_config());
        let result = adapter.verify_webhook(b"{}", "malformed_header").await;
        assert!(matches!(result, Err(WebhookError::MalformedHeader(_))));
    }

    #[tokio::test]
    async fn verify_webhook_rejects_test_mode_when_live_required() {
        let adapter = StripePaymentAdapter::new(test_config().with_require_livemode(true));
        let payload = br#"{"id":"evt_1","type":"product.created","created":1704067200,"livemode":false,"data":{"object":{}}}"#;
        let header = signature_header(SECRET, chrono::Utc::now().timestamp(), payload);

        let err = adapter.verify_webhook(payload, &header).await.unwrap_err();
        assert_eq!(err, WebhookError::LivemodeMismatch);
    }
}
