//! Stripe-specific types for webhook handling.
//!
//! These types represent Stripe API objects as they arrive in webhook
//! payloads and REST responses. They are decoded here and mapped into the
//! provider-neutral `PaymentEvent` before leaving the adapter.

use std::collections::HashMap;

use serde::Deserialize;

use crate::domain::foundation::{EventId, Timestamp};
use crate::domain::membership::SubscriptionStatus;
use crate::domain::payment::{
    AccountSnapshot, ChargeRefunded, CheckoutCompleted, CheckoutMode, InvoicePaymentFailed,
    PaymentEvent, SubscriptionSnapshot, VerifiedEvent, WebhookError, WebhookVerifier,
};

// ════════════════════════════════════════════════════════════════════════════════
// Event Envelope
// ════════════════════════════════════════════════════════════════════════════════

/// Top-level Stripe webhook event.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeWebhookEvent {
    /// Unique event ID (evt_...).
    pub id: String,

    /// Event type (e.g., "checkout.session.completed").
    #[serde(rename = "type")]
    pub event_type: String,

    /// Unix timestamp when the event was created.
    pub created: i64,

    pub data: StripeEventData,

    /// Whether this is a live mode event.
    #[serde(default)]
    pub livemode: bool,

    #[serde(default)]
    pub api_version: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeEventData {
    /// The object that triggered the event.
    pub object: serde_json::Value,
}

/// A field Stripe sends either as an id or as an expanded object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Expandable {
    Id(String),
    Object { id: String },
}

impl Expandable {
    pub fn id(&self) -> &str {
        match self {
            Expandable::Id(id) => id,
            Expandable::Object { id } => id,
        }
    }
}

fn expandable_id(field: &Option<Expandable>) -> Option<String> {
    field
        .as_ref()
        .map(|f| f.id().to_string())
        .filter(|id| !id.is_empty())
}

fn non_blank(value: Option<&String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty()).cloned()
}

// ════════════════════════════════════════════════════════════════════════════════
// Stripe Objects
// ════════════════════════════════════════════════════════════════════════════════

/// Stripe Checkout Session object.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeCheckoutSession {
    /// Session ID (cs_...).
    pub id: String,

    /// "payment", "subscription" or "setup".
    pub mode: String,

    /// "paid", "unpaid" or "no_payment_required".
    #[serde(default)]
    pub payment_status: Option<String>,

    #[serde(default)]
    pub client_reference_id: Option<String>,

    #[serde(default)]
    pub metadata: HashMap<String, String>,

    /// Amount in minor currency units.
    #[serde(default)]
    pub amount_total: Option<i64>,

    #[serde(default)]
    pub currency: Option<String>,

    #[serde(default)]
    pub customer: Option<Expandable>,

    #[serde(default)]
    pub subscription: Option<Expandable>,

    #[serde(default)]
    pub payment_intent: Option<Expandable>,

    #[serde(default)]
    pub customer_email: Option<String>,

    #[serde(default)]
    pub customer_details: Option<StripeCustomerDetails>,

    /// Hosted checkout URL (only on creation responses).
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeCustomerDetails {
    #[serde(default)]
    pub email: Option<String>,
}

impl StripeCheckoutSession {
    fn into_domain(self) -> CheckoutCompleted {
        let mode = match self.mode.as_str() {
            "subscription" => CheckoutMode::Subscription,
            "setup" => CheckoutMode::Setup,
            _ => CheckoutMode::Payment,
        };
        let buyer_uid = non_blank(self.client_reference_id.as_ref())
            .or_else(|| non_blank(self.metadata.get("buyerUid")));
        let customer_email = self
            .customer_details
            .as_ref()
            .and_then(|d| d.email.clone())
            .or(self.customer_email.clone());

        CheckoutCompleted {
            paid: self.payment_status.as_deref() == Some("paid"),
            buyer_uid,
            product_box_id: non_blank(self.metadata.get("productBoxId")),
            creator_id: non_blank(self.metadata.get("creatorId")),
            amount_total: self.amount_total,
            currency: self.currency.clone(),
            customer_id: expandable_id(&self.customer),
            subscription_id: expandable_id(&self.subscription),
            payment_intent_id: expandable_id(&self.payment_intent),
            customer_email,
            session_id: self.id,
            mode,
        }
    }
}

/// Stripe Subscription object.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeSubscription {
    /// Subscription ID (sub_...).
    pub id: String,

    pub customer: Expandable,

    pub status: SubscriptionStatus,

    /// Older API versions carry the period on the subscription itself.
    #[serde(default)]
    pub current_period_end: Option<i64>,

    #[serde(default)]
    pub cancel_at_period_end: bool,

    #[serde(default)]
    pub metadata: HashMap<String, String>,

    #[serde(default)]
    pub items: StripeSubscriptionItems,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StripeSubscriptionItems {
    #[serde(default)]
    pub data: Vec<StripeSubscriptionItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeSubscriptionItem {
    /// Newer API versions carry the period per item.
    #[serde(default)]
    pub current_period_end: Option<i64>,
}

impl StripeSubscription {
    pub fn into_domain(self) -> SubscriptionSnapshot {
        let period_end = self
            .current_period_end
            .or_else(|| self.items.data.iter().filter_map(|i| i.current_period_end).max())
            .and_then(Timestamp::from_unix_secs);

        SubscriptionSnapshot {
            customer_id: self.customer.id().to_string(),
            uid: non_blank(self.metadata.get("uid")),
            id: self.id,
            status: self.status,
            current_period_end: period_end,
            cancel_at_period_end: self.cancel_at_period_end,
        }
    }
}

/// Stripe Invoice object.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeInvoice {
    /// Invoice ID (in_...).
    pub id: String,

    #[serde(default)]
    pub customer: Option<Expandable>,

    /// Older API versions.
    #[serde(default)]
    pub subscription: Option<Expandable>,

    /// Newer API versions nest the subscription under `parent`.
    #[serde(default)]
    pub parent: Option<StripeInvoiceParent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeInvoiceParent {
    #[serde(default)]
    pub subscription_details: Option<StripeSubscriptionDetails>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeSubscriptionDetails {
    #[serde(default)]
    pub subscription: Option<Expandable>,
}

impl StripeInvoice {
    fn into_domain(self) -> InvoicePaymentFailed {
        let subscription_id = expandable_id(&self.subscription).or_else(|| {
            self.parent
                .as_ref()
                .and_then(|p| p.subscription_details.as_ref())
                .and_then(|d| expandable_id(&d.subscription))
        });

        InvoicePaymentFailed {
            customer_id: expandable_id(&self.customer),
            invoice_id: self.id,
            subscription_id,
        }
    }
}

/// Stripe Charge object.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeCharge {
    /// Charge ID (ch_...).
    pub id: String,

    #[serde(default)]
    pub payment_intent: Option<Expandable>,

    #[serde(default)]
    pub amount_refunded: i64,

    /// True once the charge is refunded in full.
    #[serde(default)]
    pub refunded: bool,
}

impl StripeCharge {
    fn into_domain(self) -> ChargeRefunded {
        ChargeRefunded {
            payment_intent_id: expandable_id(&self.payment_intent),
            charge_id: self.id,
            amount_refunded: self.amount_refunded,
            fully_refunded: self.refunded,
        }
    }
}

/// Stripe Connect Account object.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeAccount {
    /// Account ID (acct_...).
    pub id: String,

    #[serde(default)]
    pub charges_enabled: bool,

    #[serde(default)]
    pub payouts_enabled: bool,

    #[serde(default)]
    pub details_submitted: bool,

    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl StripeAccount {
    pub fn into_domain(self) -> AccountSnapshot {
        AccountSnapshot {
            creator_id: non_blank(self.metadata.get("creatorId")),
            account_id: self.id,
            charges_enabled: self.charges_enabled,
            payouts_enabled: self.payouts_enabled,
            details_submitted: self.details_submitted,
        }
    }
}

/// Stripe Refund object.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeRefund {
    pub id: String,
    pub status: String,
}

/// Stripe Account Link object.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeAccountLink {
    pub url: String,
}

/// Stripe error envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorResponse {
    pub error: StripeErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorBody {
    #[serde(default)]
    pub code: Option<String>,

    #[serde(default)]
    pub message: Option<String>,

    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Decoding
// ════════════════════════════════════════════════════════════════════════════════

fn object<T: for<'de> Deserialize<'de>>(event: &StripeWebhookEvent, what: &str) -> Result<T, WebhookError> {
    serde_json::from_value(event.data.object.clone())
        .map_err(|e| WebhookError::MalformedPayload(format!("Invalid {}: {}", what, e)))
}

/// Maps a Stripe event onto the event kinds this service handles.
fn to_payment_event(event: &StripeWebhookEvent) -> Result<PaymentEvent, WebhookError> {
    let decoded = match event.event_type.as_str() {
        "checkout.session.completed" => {
            let session: StripeCheckoutSession = object(event, "checkout session")?;
            PaymentEvent::CheckoutCompleted(session.into_domain())
        }
        "customer.subscription.created" | "customer.subscription.updated" => {
            let sub: StripeSubscription = object(event, "subscription")?;
            PaymentEvent::SubscriptionChanged(sub.into_domain())
        }
        "customer.subscription.deleted" => {
            let sub: StripeSubscription = object(event, "subscription")?;
            PaymentEvent::SubscriptionDeleted(sub.into_domain())
        }
        "invoice.payment_failed" => {
            let invoice: StripeInvoice = object(event, "invoice")?;
            PaymentEvent::InvoicePaymentFailed(invoice.into_domain())
        }
        "charge.refunded" => {
            let charge: StripeCharge = object(event, "charge")?;
            PaymentEvent::ChargeRefunded(charge.into_domain())
        }
        "account.updated" => {
            let account: StripeAccount = object(event, "account")?;
            PaymentEvent::AccountUpdated(account.into_domain())
        }
        other => PaymentEvent::Unknown(other.to_string()),
    };
    Ok(decoded)
}

/// Authenticates a delivery and decodes it into a `VerifiedEvent`.
///
/// The signature is checked against the raw bytes before any parsing.
/// Shared by the Stripe adapter and the mock provider so both produce
/// verified events the same way.
pub(crate) fn verify_and_decode(
    verifier: &WebhookVerifier,
    payload: &[u8],
    signature: &str,
    now: i64,
    require_livemode: bool,
) -> Result<VerifiedEvent, WebhookError> {
    verifier.verify(payload, signature, now)?;

    let raw: serde_json::Value = serde_json::from_slice(payload)
        .map_err(|e| WebhookError::MalformedPayload(format!("Invalid JSON: {}", e)))?;
    let event: StripeWebhookEvent = serde_json::from_value(raw.clone())
        .map_err(|e| WebhookError::MalformedPayload(format!("Invalid event: {}", e)))?;

    if require_livemode && !event.livemode {
        tracing::warn!(event_id = %event.id, "Rejected test mode event");
        return Err(WebhookError::LivemodeMismatch);
    }

    let id = EventId::new(event.id.clone())
        .map_err(|e| WebhookError::MalformedPayload(e.to_string()))?;
    let created = Timestamp::from_unix_secs(event.created)
        .ok_or_else(|| WebhookError::MalformedPayload("Invalid created timestamp".to_string()))?;
    let decoded = to_payment_event(&event)?;

    Ok(VerifiedEvent::new(
        id,
        event.event_type.clone(),
        created,
        event.livemode,
        decoded,
        raw,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payment::signature_header;
    use secrecy::SecretString;
    use serde_json::json;

    const SECRET: &str = "whsec_test_secret";
    const NOW: i64 = 1_704_067_200;

    fn verifier() -> WebhookVerifier {
        WebhookVerifier::new(SecretString::new(SECRET.to_string()))
    }

    fn envelope(event_type: &str, object: serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(&json!({
            "id": "evt_1",
            "type": event_type,
            "created": NOW,
            "livemode": false,
            "data": { "object": object }
        }))
        .unwrap()
    }

    fn decode(payload: &[u8]) -> Result<VerifiedEvent, WebhookError> {
        let header = signature_header(SECRET, NOW, payload);
        verify_and_decode(&verifier(), payload, &header, NOW, false)
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Checkout Sessions
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn parse_payment_checkout_session() {
        let payload = envelope(
            "checkout.session.completed",
            json!({
                "id": "cs_123",
                "mode": "payment",
                "payment_status": "paid",
                "client_reference_id": "bob",
                "metadata": { "productBoxId": "box_1", "creatorId": "carol" },
                "amount_total": 2999,
                "currency": "usd",
                "payment_intent": "pi_1",
                "customer": null
            }),
        );

        let event = decode(&payload).unwrap();
        match event.event() {
            PaymentEvent::CheckoutCompleted(c) => {
                assert_eq!(c.session_id, "cs_123");
                assert_eq!(c.mode, CheckoutMode::Payment);
                assert!(c.paid);
                assert_eq!(c.buyer_uid.as_deref(), Some("bob"));
                assert_eq!(c.product_box_id.as_deref(), Some("box_1"));
                assert_eq!(c.creator_id.as_deref(), Some("carol"));
                assert_eq!(c.amount_total, Some(2999));
                assert_eq!(c.payment_intent_id.as_deref(), Some("pi_1"));
                assert_eq!(c.customer_id, None);
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert_eq!(event.id().as_str(), "evt_1");
        assert_eq!(event.created().as_unix_secs(), NOW);
    }

    #[test]
    fn buyer_falls_back_to_metadata() {
        let payload = envelope(
            "checkout.session.completed",
            json!({
                "id": "cs_9",
                "mode": "payment",
                "payment_status": "paid",
                "client_reference_id": "",
                "metadata": { "buyerUid": "dana", "productBoxId": "box_2" }
            }),
        );

        match decode(&payload).unwrap().event() {
            PaymentEvent::CheckoutCompleted(c) => assert_eq!(c.buyer_uid.as_deref(), Some("dana")),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn expanded_customer_object_yields_id() {
        let payload = envelope(
            "checkout.session.completed",
            json!({
                "id": "cs_sub",
                "mode": "subscription",
                "payment_status": "paid",
                "customer": { "id": "cus_1", "object": "customer" },
                "subscription": "sub_1"
            }),
        );

        match decode(&payload).unwrap().event() {
            PaymentEvent::CheckoutCompleted(c) => {
                assert_eq!(c.mode, CheckoutMode::Subscription);
                assert_eq!(c.customer_id.as_deref(), Some("cus_1"));
                assert_eq!(c.subscription_id.as_deref(), Some("sub_1"));
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Subscriptions, Invoices, Charges, Accounts
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn parse_subscription_with_item_period() {
        let payload = envelope(
            "customer.subscription.updated",
            json!({
                "id": "sub_1",
                "customer": "cus_1",
                "status": "past_due",
                "cancel_at_period_end": true,
                "metadata": { "uid": "alice" },
                "items": { "data": [ { "current_period_end": 1_706_745_600 } ] }
            }),
        );

        match decode(&payload).unwrap().event() {
            PaymentEvent::SubscriptionChanged(s) => {
                assert_eq!(s.status, SubscriptionStatus::PastDue);
                assert_eq!(s.uid.as_deref(), Some("alice"));
                assert!(s.cancel_at_period_end);
                assert_eq!(s.current_period_end.map(|t| t.as_unix_secs()), Some(1_706_745_600));
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn unknown_subscription_status_is_tolerated() {
        let payload = envelope(
            "customer.subscription.deleted",
            json!({ "id": "sub_1", "customer": "cus_1", "status": "something_new" }),
        );

        match decode(&payload).unwrap().event() {
            PaymentEvent::SubscriptionDeleted(s) => assert_eq!(s.status, SubscriptionStatus::Unknown),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn invoice_subscription_from_parent_details() {
        let payload = envelope(
            "invoice.payment_failed",
            json!({
                "id": "in_1",
                "customer": "cus_1",
                "parent": { "subscription_details": { "subscription": "sub_9" } }
            }),
        );

        match decode(&payload).unwrap().event() {
            PaymentEvent::InvoicePaymentFailed(i) => {
                assert_eq!(i.subscription_id.as_deref(), Some("sub_9"))
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn parse_charge_refunded() {
        let payload = envelope(
            "charge.refunded",
            json!({ "id": "ch_1", "payment_intent": "pi_1", "amount_refunded": 2999, "refunded": true }),
        );

        match decode(&payload).unwrap().event() {
            PaymentEvent::ChargeRefunded(c) => {
                assert!(c.fully_refunded);
                assert_eq!(c.payment_intent_id.as_deref(), Some("pi_1"));
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn parse_account_updated() {
        let payload = envelope(
            "account.updated",
            json!({
                "id": "acct_1",
                "charges_enabled": true,
                "payouts_enabled": false,
                "details_submitted": true,
                "metadata": { "creatorId": "carol" }
            }),
        );

        match decode(&payload).unwrap().event() {
            PaymentEvent::AccountUpdated(a) => {
                assert_eq!(a.creator_id.as_deref(), Some("carol"));
                assert!(!a.payouts_enabled);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn unknown_event_type_is_carried_by_name() {
        let payload = envelope("product.created", json!({ "id": "prod_1" }));
        let event = decode(&payload).unwrap();
        assert_eq!(event.event(), &PaymentEvent::Unknown("product.created".to_string()));
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Rejections
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn forged_signature_is_rejected_before_parsing() {
        let payload = b"not even json";
        let header = signature_header("whsec_wrong", NOW, payload);
        let err = verify_and_decode(&verifier(), payload, &header, NOW, false).unwrap_err();
        assert_eq!(err, WebhookError::InvalidSignature);
    }

    #[test]
    fn signed_garbage_is_malformed_payload() {
        let err = decode(b"not even json").unwrap_err();
        assert!(matches!(err, WebhookError::MalformedPayload(_)));
    }

    #[test]
    fn test_mode_event_rejected_when_livemode_required() {
        let payload = envelope("product.created", json!({ "id": "prod_1" }));
        let header = signature_header(SECRET, NOW, &payload);
        let err = verify_and_decode(&verifier(), &payload, &header, NOW, true).unwrap_err();
        assert_eq!(err, WebhookError::LivemodeMismatch);
    }

    #[test]
    fn checkout_with_bad_object_is_malformed() {
        let payload = envelope("checkout.session.completed", json!({ "mode": "payment" }));
        let err = decode(&payload).unwrap_err();
        assert!(matches!(err, WebhookError::MalformedPayload(_)));
    }
}
