//! Mock payment provider for testing.
//!
//! Webhook verification runs the real signature check against a fixed
//! secret, so tests exercise the same path production does. REST calls
//! are answered from in-memory state. Supports:
//! - Pre-configured subscriptions and accounts
//! - Error injection per method
//! - Call tracking

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use secrecy::SecretString;

use crate::domain::foundation::CreatorId;
use crate::domain::payment::{
    AccountSnapshot, SubscriptionSnapshot, VerifiedEvent, WebhookError, WebhookVerifier,
};
use crate::ports::{
    CheckoutSession, PaymentError, PaymentProvider, PortalSession, RefundReceipt,
    SubscriptionCheckoutRequest,
};

use super::webhook_types::verify_and_decode;

/// Webhook secret the mock verifies against unless overridden.
pub const MOCK_WEBHOOK_SECRET: &str = "whsec_mock_secret";

/// Mock payment provider.
///
/// # Example
///
/// ```ignore
/// let mock = MockPaymentProvider::new();
/// mock.set_subscription(snapshot);
/// mock.fail_method("refund_payment", PaymentError::network("down"));
///
/// let header = signature_header(MOCK_WEBHOOK_SECRET, now, &payload);
/// let event = mock.verify_webhook(&payload, &header).await?;
/// ```
#[derive(Clone)]
pub struct MockPaymentProvider {
    verifier: WebhookVerifier,
    inner: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    subscriptions: HashMap<String, SubscriptionSnapshot>,
    accounts: HashMap<String, AccountSnapshot>,
    /// Errors returned by the named method until cleared.
    method_errors: HashMap<String, PaymentError>,
    call_log: Vec<MethodCall>,
    next_id: u32,
}

/// A recorded call, for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodCall {
    pub method: String,
    pub args: Vec<String>,
}

impl Default for MockPaymentProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPaymentProvider {
    pub fn new() -> Self {
        Self::with_webhook_secret(MOCK_WEBHOOK_SECRET)
    }

    pub fn with_webhook_secret(secret: &str) -> Self {
        Self {
            verifier: WebhookVerifier::new(SecretString::new(secret.to_string())),
            inner: Arc::new(Mutex::new(MockState::default())),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Makes `retrieve_subscription` return this snapshot.
    pub fn set_subscription(&self, subscription: SubscriptionSnapshot) {
        self.state()
            .subscriptions
            .insert(subscription.id.clone(), subscription);
    }

    /// Makes `retrieve_account` return this snapshot.
    pub fn set_account(&self, account: AccountSnapshot) {
        self.state()
            .accounts
            .insert(account.account_id.clone(), account);
    }

    /// Makes every call to `method` fail with `error`.
    pub fn fail_method(&self, method: &str, error: PaymentError) {
        self.state().method_errors.insert(method.to_string(), error);
    }

    pub fn clear_errors(&self) {
        self.state().method_errors.clear();
    }

    pub fn calls(&self) -> Vec<MethodCall> {
        self.state().call_log.clone()
    }

    /// Number of calls made to `method`.
    pub fn call_count(&self, method: &str) -> usize {
        self.state()
            .call_log
            .iter()
            .filter(|c| c.method == method)
            .count()
    }

    /// Logs the call, then returns the injected error if any, else a fresh id.
    fn enter(&self, method: &str, args: &[&str]) -> Result<u32, PaymentError> {
        let mut state = self.state();
        state.call_log.push(MethodCall {
            method: method.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        });
        if let Some(error) = state.method_errors.get(method) {
            return Err(error.clone());
        }
        state.next_id += 1;
        Ok(state.next_id)
    }
}

#[async_trait]
impl PaymentProvider for MockPaymentProvider {
    async fn verify_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<VerifiedEvent, WebhookError> {
        let now = chrono::Utc::now().timestamp();
        verify_and_decode(&self.verifier, payload, signature, now, false)
    }

    async fn create_subscription_checkout(
        &self,
        request: SubscriptionCheckoutRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        let n = self.enter(
            "create_subscription_checkout",
            &[request.uid.as_str(), &request.price_id],
        )?;
        let id = format!("cs_mock_{}", n);
        Ok(CheckoutSession {
            url: format!("https://checkout.stripe.test/c/pay/{}", id),
            id,
        })
    }

    async fn create_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> Result<PortalSession, PaymentError> {
        let n = self.enter("create_portal_session", &[customer_id, return_url])?;
        let id = format!("bps_mock_{}", n);
        Ok(PortalSession {
            url: format!("https://billing.stripe.test/p/session/{}", id),
            id,
        })
    }

    async fn retrieve_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Option<SubscriptionSnapshot>, PaymentError> {
        self.enter("retrieve_subscription", &[subscription_id])?;
        Ok(self.state().subscriptions.get(subscription_id).cloned())
    }

    async fn create_connected_account(
        &self,
        creator_id: &CreatorId,
        email: Option<&str>,
    ) -> Result<AccountSnapshot, PaymentError> {
        let n = self.enter(
            "create_connected_account",
            &[creator_id.as_str(), email.unwrap_or_default()],
        )?;
        let account = AccountSnapshot {
            account_id: format!("acct_mock_{}", n),
            charges_enabled: false,
            payouts_enabled: false,
            details_submitted: false,
            creator_id: Some(creator_id.to_string()),
        };
        self.state()
            .accounts
            .insert(account.account_id.clone(), account.clone());
        Ok(account)
    }

    async fn create_account_link(
        &self,
        account_id: &str,
        refresh_url: &str,
        return_url: &str,
    ) -> Result<String, PaymentError> {
        self.enter("create_account_link", &[account_id, refresh_url, return_url])?;
        Ok(format!("https://connect.stripe.test/setup/{}", account_id))
    }

    async fn retrieve_account(
        &self,
        account_id: &str,
    ) -> Result<Option<AccountSnapshot>, PaymentError> {
        self.enter("retrieve_account", &[account_id])?;
        Ok(self.state().accounts.get(account_id).cloned())
    }

    async fn refund_payment(
        &self,
        payment_intent_id: &str,
        idempotency_key: &str,
    ) -> Result<RefundReceipt, PaymentError> {
        let n = self.enter("refund_payment", &[payment_intent_id, idempotency_key])?;
        Ok(RefundReceipt {
            refund_id: format!("re_mock_{}", n),
            status: "succeeded".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::membership::SubscriptionStatus;
    use crate::domain::payment::signature_header;
    use crate::ports::PaymentErrorCode;

    #[tokio::test]
    async fn verifies_real_signatures() {
        let mock = MockPaymentProvider::new();
        let payload = br#"{"id":"evt_1","type":"product.created","created":1704067200,"data":{"object":{}}}"#;
        let header = signature_header(MOCK_WEBHOOK_SECRET, chrono::Utc::now().timestamp(), payload);

        let event = mock.verify_webhook(payload, &header).await.unwrap();
        assert_eq!(event.event_type(), "product.created");
    }

    #[tokio::test]
    async fn rejects_wrong_secret() {
        let mock = MockPaymentProvider::new();
        let payload = br#"{"id":"evt_1"}"#;
        let header = signature_header("whsec_other", chrono::Utc::now().timestamp(), payload);

        assert_eq!(
            mock.verify_webhook(payload, &header).await.unwrap_err(),
            WebhookError::InvalidSignature
        );
    }

    #[tokio::test]
    async fn returns_configured_subscription() {
        let mock = MockPaymentProvider::new();
        mock.set_subscription(SubscriptionSnapshot {
            id: "sub_1".to_string(),
            customer_id: "cus_1".to_string(),
            status: SubscriptionStatus::Active,
            current_period_end: None,
            cancel_at_period_end: false,
            uid: Some("alice".to_string()),
        });

        let sub = mock.retrieve_subscription("sub_1").await.unwrap().unwrap();
        assert_eq!(sub.customer_id, "cus_1");
        assert!(mock.retrieve_subscription("sub_2").await.unwrap().is_none());
        assert_eq!(mock.call_count("retrieve_subscription"), 2);
    }

    #[tokio::test]
    async fn injected_errors_are_returned() {
        let mock = MockPaymentProvider::new();
        mock.fail_method("refund_payment", PaymentError::network("connection reset"));

        let err = mock.refund_payment("pi_1", "refund-cs_1").await.unwrap_err();
        assert_eq!(err.code, PaymentErrorCode::NetworkError);

        mock.clear_errors();
        assert!(mock.refund_payment("pi_1", "refund-cs_1").await.is_ok());
    }

    #[tokio::test]
    async fn created_accounts_can_be_retrieved() {
        let mock = MockPaymentProvider::new();
        let creator = CreatorId::new("carol").unwrap();
        let account = mock.create_connected_account(&creator, None).await.unwrap();

        let fetched = mock.retrieve_account(&account.account_id).await.unwrap().unwrap();
        assert_eq!(fetched.creator_id.as_deref(), Some("carol"));
    }
}
