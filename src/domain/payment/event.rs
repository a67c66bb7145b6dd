//! Provider events after signature verification.
//!
//! Provider payloads are decoded into `PaymentEvent`, a closed set of the
//! event kinds this service acts on plus an `Unknown` fallback. New event
//! types therefore land in `Unknown` and are acknowledged without action.

use serde::Serialize;

use crate::domain::foundation::{EventId, Timestamp};
use crate::domain::membership::SubscriptionStatus;

/// Checkout mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutMode {
    /// One-time bundle purchase.
    Payment,
    /// creator_pro signup.
    Subscription,
    Setup,
}

/// A completed checkout session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutCompleted {
    pub session_id: String,
    pub mode: CheckoutMode,
    /// `payment_status == "paid"`. Delayed payment methods complete unpaid.
    pub paid: bool,
    /// `client_reference_id`, falling back to `metadata.buyerUid`.
    pub buyer_uid: Option<String>,
    pub product_box_id: Option<String>,
    pub creator_id: Option<String>,
    pub amount_total: Option<i64>,
    pub currency: Option<String>,
    pub customer_id: Option<String>,
    pub subscription_id: Option<String>,
    pub payment_intent_id: Option<String>,
    pub customer_email: Option<String>,
}

/// Provider view of a subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscriptionSnapshot {
    pub id: String,
    pub customer_id: String,
    pub status: SubscriptionStatus,
    pub current_period_end: Option<Timestamp>,
    pub cancel_at_period_end: bool,
    /// `metadata.uid` when the subscription was created by our checkout.
    pub uid: Option<String>,
}

/// A failed invoice payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvoicePaymentFailed {
    pub invoice_id: String,
    pub customer_id: Option<String>,
    pub subscription_id: Option<String>,
}

/// A refunded charge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChargeRefunded {
    pub charge_id: String,
    pub payment_intent_id: Option<String>,
    pub amount_refunded: i64,
    /// True once the whole charge has been refunded.
    pub fully_refunded: bool,
}

/// Provider view of a creator's connected account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountSnapshot {
    pub account_id: String,
    pub charges_enabled: bool,
    pub payouts_enabled: bool,
    pub details_submitted: bool,
    /// `metadata.creatorId` set when we created the account.
    pub creator_id: Option<String>,
}

/// Events the reconciler understands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum PaymentEvent {
    CheckoutCompleted(CheckoutCompleted),
    /// `customer.subscription.created` and `customer.subscription.updated`.
    SubscriptionChanged(SubscriptionSnapshot),
    SubscriptionDeleted(SubscriptionSnapshot),
    InvoicePaymentFailed(InvoicePaymentFailed),
    ChargeRefunded(ChargeRefunded),
    AccountUpdated(AccountSnapshot),
    /// Any other event type, carried by name.
    Unknown(String),
}

impl PaymentEvent {
    pub fn is_unknown(&self) -> bool {
        matches!(self, PaymentEvent::Unknown(_))
    }
}

/// An event whose signature has been checked.
///
/// Only signature verification inside this crate can produce one, which
/// is what lets entitlement writes demand it as proof of origin.
#[derive(Debug, Clone)]
pub struct VerifiedEvent {
    id: EventId,
    event_type: String,
    created: Timestamp,
    livemode: bool,
    event: PaymentEvent,
    payload: serde_json::Value,
}

impl VerifiedEvent {
    pub(crate) fn new(
        id: EventId,
        event_type: impl Into<String>,
        created: Timestamp,
        livemode: bool,
        event: PaymentEvent,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            id,
            event_type: event_type.into(),
            created,
            livemode,
            event,
            payload,
        }
    }

    pub fn id(&self) -> &EventId {
        &self.id
    }

    /// Provider event type string, e.g. `checkout.session.completed`.
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn created(&self) -> Timestamp {
        self.created
    }

    pub fn livemode(&self) -> bool {
        self.livemode
    }

    pub fn event(&self) -> &PaymentEvent {
        &self.event
    }

    /// The raw JSON body, kept for the webhook event log.
    pub fn payload(&self) -> &serde_json::Value {
        &self.payload
    }
}
