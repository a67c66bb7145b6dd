//! PaymentProvider port - payment processing integration.
//!
//! Covers webhook authentication and the handful of REST calls this
//! service makes to the provider. Adapters: `StripePaymentAdapter` for
//! production, `MockPaymentProvider` for tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{CreatorId, DomainError, ErrorCode, UserId};
use crate::domain::payment::{AccountSnapshot, SubscriptionSnapshot, VerifiedEvent, WebhookError};

/// Request to start a creator_pro subscription checkout.
#[derive(Debug, Clone)]
pub struct SubscriptionCheckoutRequest {
    pub uid: UserId,
    pub email: Option<String>,
    /// Reuse an existing customer so subscriptions stay linked.
    pub customer_id: Option<String>,
    pub price_id: String,
    pub success_url: String,
    pub cancel_url: String,
}

/// Hosted checkout page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

/// Hosted billing portal page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalSession {
    pub id: String,
    pub url: String,
}

/// Confirmation of a refund request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundReceipt {
    pub refund_id: String,
    /// Provider status (`pending`, `succeeded`, ...).
    pub status: String,
}

#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Authenticates a webhook delivery and decodes it.
    ///
    /// Must reject before decoding when the signature doesn't match.
    async fn verify_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<VerifiedEvent, WebhookError>;

    async fn create_subscription_checkout(
        &self,
        request: SubscriptionCheckoutRequest,
    ) -> Result<CheckoutSession, PaymentError>;

    async fn create_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> Result<PortalSession, PaymentError>;

    /// Returns `None` if the provider doesn't know the subscription.
    async fn retrieve_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Option<SubscriptionSnapshot>, PaymentError>;

    /// Creates an Express connected account tagged with the creator id.
    async fn create_connected_account(
        &self,
        creator_id: &CreatorId,
        email: Option<&str>,
    ) -> Result<AccountSnapshot, PaymentError>;

    /// Returns a hosted onboarding URL for the account.
    async fn create_account_link(
        &self,
        account_id: &str,
        refresh_url: &str,
        return_url: &str,
    ) -> Result<String, PaymentError>;

    /// Returns `None` if the provider doesn't know the account.
    async fn retrieve_account(
        &self,
        account_id: &str,
    ) -> Result<Option<AccountSnapshot>, PaymentError>;

    /// Refunds a payment in full.
    ///
    /// `idempotency_key` makes repeated calls for one purchase safe.
    async fn refund_payment(
        &self,
        payment_intent_id: &str,
        idempotency_key: &str,
    ) -> Result<RefundReceipt, PaymentError>;
}

/// Payment operation error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentError {
    pub code: PaymentErrorCode,
    pub message: String,
    /// Provider's error code (if available).
    pub provider_code: Option<String>,
    pub retryable: bool,
}

impl PaymentError {
    pub fn new(code: PaymentErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider_code: None,
            retryable: code.is_retryable(),
        }
    }

    pub fn with_provider_code(mut self, code: impl Into<String>) -> Self {
        self.provider_code = Some(code.into());
        self
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::NetworkError, message)
    }

    pub fn not_found(resource: &str) -> Self {
        Self::new(PaymentErrorCode::NotFound, format!("{} not found", resource))
    }

    pub fn provider(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::ProviderError, message)
    }
}

impl std::fmt::Display for PaymentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for PaymentError {}

impl From<PaymentError> for DomainError {
    fn from(err: PaymentError) -> Self {
        let code = match err.code {
            PaymentErrorCode::NotFound => ErrorCode::NotFound,
            PaymentErrorCode::InvalidRequest => ErrorCode::ValidationFailed,
            _ => ErrorCode::ExternalProviderError,
        };
        let mut domain = DomainError::new(code, err.message);
        if let Some(provider_code) = err.provider_code {
            domain = domain.with_detail("provider_code", provider_code);
        }
        domain
    }
}

/// Payment error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentErrorCode {
    NetworkError,
    AuthenticationError,
    InvalidRequest,
    NotFound,
    RateLimitExceeded,
    ProviderError,
}

impl PaymentErrorCode {
    /// Check if this error type is typically retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PaymentErrorCode::NetworkError
                | PaymentErrorCode::RateLimitExceeded
                | PaymentErrorCode::ProviderError
        )
    }
}

impl std::fmt::Display for PaymentErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentErrorCode::NetworkError => "network_error",
            PaymentErrorCode::AuthenticationError => "authentication_error",
            PaymentErrorCode::InvalidRequest => "invalid_request",
            PaymentErrorCode::NotFound => "not_found",
            PaymentErrorCode::RateLimitExceeded => "rate_limit_exceeded",
            PaymentErrorCode::ProviderError => "provider_error",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_errors_are_retryable() {
        assert!(PaymentError::network("connection reset").retryable);
        assert!(!PaymentError::not_found("subscription").retryable);
    }

    #[test]
    fn converts_to_domain_error_with_provider_code() {
        let err = PaymentError::provider("boom").with_provider_code("resource_missing");
        let domain: DomainError = err.into();
        assert_eq!(domain.code, ErrorCode::ExternalProviderError);
        assert_eq!(
            domain.details.get("provider_code"),
            Some(&"resource_missing".to_string())
        );
    }

    #[test]
    fn not_found_maps_to_not_found() {
        let domain: DomainError = PaymentError::not_found("account").into();
        assert_eq!(domain.code, ErrorCode::NotFound);
    }

    #[test]
    fn payment_provider_is_object_safe() {
        fn _accepts_dyn(_p: &dyn PaymentProvider) {}
    }
}
