//! ReconcileWebhookHandler - turns Stripe webhooks into local state.
//!
//! Per event: verify the signature, claim the event in the log, apply its
//! side effects under a timeout, then mark it recorded or failed. Stripe
//! redelivers anything that isn't answered with 2xx, so every side effect
//! here is idempotent and a recorded event short-circuits.

use std::sync::Arc;
use std::time::Duration;

use tracing::Instrument;

use crate::domain::foundation::{CreatorId, DomainError, ErrorCode, EventId, PurchaseId, Timestamp};
use crate::domain::membership::MembershipStatus;
use crate::domain::payment::{
    AccountSnapshot, ChargeRefunded, CheckoutCompleted, CheckoutMode, InvoicePaymentFailed,
    PaymentEvent, SubscriptionSnapshot, VerifiedEvent,
};
use crate::domain::purchase::ConnectedAccount;
use crate::ports::{
    ClaimResult, ConnectedAccountStore, EntitlementStore, MembershipStore, PaymentProvider,
    WebhookEventRepository,
};

use super::super::membership::{apply_subscription, downgrade, resolve_subscriber, SubscriptionApplied};
use super::super::purchase::{GrantAccessHandler, GrantAccessResult};

/// Raw webhook delivery.
#[derive(Debug, Clone)]
pub struct ReconcileWebhookCommand {
    pub payload: Vec<u8>,
    /// `Stripe-Signature` header value.
    pub signature: String,
}

/// What processing an event did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookAction {
    PurchaseRecorded { purchase_id: PurchaseId },
    PurchaseAlreadyRecorded { purchase_id: PurchaseId },
    Subscription(SubscriptionApplied),
    MarkedPastDue,
    PurchaseRefunded { purchase_id: PurchaseId },
    AccountRefreshed { creator_id: CreatorId },
    /// Acknowledged without changing anything.
    Ignored { reason: String },
}

/// Result of a webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileWebhookResult {
    /// Event processed now.
    Recorded {
        event_id: EventId,
        attempt: u32,
        action: WebhookAction,
    },
    /// Event was recorded by an earlier delivery.
    AlreadyRecorded { event_id: EventId },
}

/// Handler for Stripe webhook deliveries.
pub struct ReconcileWebhookHandler {
    payment_provider: Arc<dyn PaymentProvider>,
    events: Arc<dyn WebhookEventRepository>,
    memberships: Arc<dyn MembershipStore>,
    entitlements: Arc<dyn EntitlementStore>,
    accounts: Arc<dyn ConnectedAccountStore>,
    timeout: Duration,
}

impl ReconcileWebhookHandler {
    pub fn new(
        payment_provider: Arc<dyn PaymentProvider>,
        events: Arc<dyn WebhookEventRepository>,
        memberships: Arc<dyn MembershipStore>,
        entitlements: Arc<dyn EntitlementStore>,
        accounts: Arc<dyn ConnectedAccountStore>,
        timeout: Duration,
    ) -> Self {
        Self {
            payment_provider,
            events,
            memberships,
            entitlements,
            accounts,
            timeout,
        }
    }

    pub async fn handle(&self, cmd: ReconcileWebhookCommand) -> Result<ReconcileWebhookResult, DomainError> {
        // 1. Authenticate before touching anything
        let event = self
            .payment_provider
            .verify_webhook(&cmd.payload, &cmd.signature)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Rejected webhook delivery");
                DomainError::from(e)
            })?;

        let span = tracing::info_span!(
            "webhook",
            event_id = %event.id(),
            event_type = event.event_type()
        );
        self.process(event).instrument(span).await
    }

    async fn process(&self, event: VerifiedEvent) -> Result<ReconcileWebhookResult, DomainError> {
        let event_id = event.id().clone();

        // 2. Claim the event in the log
        let attempt = match self.events.claim(&event, Timestamp::now()).await? {
            ClaimResult::AlreadyRecorded => {
                tracing::debug!("Event already recorded");
                return Ok(ReconcileWebhookResult::AlreadyRecorded { event_id });
            }
            ClaimResult::Claimed { attempt } => attempt,
        };

        // 3. Apply side effects, bounded by the processing timeout
        let outcome = match tokio::time::timeout(self.timeout, self.dispatch(&event)).await {
            Ok(result) => result,
            Err(_) => Err(DomainError::new(
                ErrorCode::Timeout,
                format!("Processing exceeded {:?}", self.timeout),
            )),
        };

        // 4. Record the outcome
        match outcome {
            Ok(action) => {
                self.events.mark_recorded(&event_id, Timestamp::now()).await?;
                tracing::info!(attempt, action = ?action, "Webhook recorded");
                Ok(ReconcileWebhookResult::Recorded {
                    event_id,
                    attempt,
                    action,
                })
            }
            Err(e) => {
                tracing::error!(attempt, error = %e, retryable = e.is_retryable(), "Webhook processing failed");
                if let Err(mark_err) = self
                    .events
                    .mark_failed(&event_id, &e.message, Timestamp::now())
                    .await
                {
                    tracing::error!(error = %mark_err, "Failed to mark webhook event failed");
                }
                Err(e)
            }
        }
    }

    async fn dispatch(&self, event: &VerifiedEvent) -> Result<WebhookAction, DomainError> {
        match event.event() {
            PaymentEvent::CheckoutCompleted(checkout) => match checkout.mode {
                CheckoutMode::Payment => self.checkout_payment(event).await,
                CheckoutMode::Subscription => self.checkout_subscription(checkout).await,
                CheckoutMode::Setup => Ok(ignored("setup checkout")),
            },
            PaymentEvent::SubscriptionChanged(snapshot) => self.subscription_changed(snapshot).await,
            PaymentEvent::SubscriptionDeleted(snapshot) => self.subscription_deleted(snapshot).await,
            PaymentEvent::InvoicePaymentFailed(invoice) => self.invoice_payment_failed(invoice).await,
            PaymentEvent::ChargeRefunded(charge) => self.charge_refunded(charge).await,
            PaymentEvent::AccountUpdated(account) => self.account_updated(account).await,
            PaymentEvent::Unknown(event_type) => Ok(ignored(format!("unhandled type {}", event_type))),
        }
    }

    async fn checkout_payment(&self, event: &VerifiedEvent) -> Result<WebhookAction, DomainError> {
        let recorder = GrantAccessHandler::new(self.entitlements.clone());
        Ok(match recorder.handle(event).await? {
            GrantAccessResult::Granted { purchase_id } => WebhookAction::PurchaseRecorded { purchase_id },
            GrantAccessResult::AlreadyGranted { purchase_id } => {
                WebhookAction::PurchaseAlreadyRecorded { purchase_id }
            }
            GrantAccessResult::NotAPurchase => ignored("checkout not paid"),
        })
    }

    async fn checkout_subscription(
        &self,
        checkout: &CheckoutCompleted,
    ) -> Result<WebhookAction, DomainError> {
        let Some(subscription_id) = checkout.subscription_id.as_deref() else {
            return Ok(ignored("subscription checkout without subscription"));
        };
        let Some(mut snapshot) = self
            .payment_provider
            .retrieve_subscription(subscription_id)
            .await?
        else {
            tracing::warn!(subscription_id, "Checkout references unknown subscription");
            return Ok(ignored("subscription not found"));
        };
        if snapshot.uid.is_none() {
            snapshot.uid = checkout.buyer_uid.clone();
        }
        self.subscription_changed(&snapshot).await
    }

    async fn subscription_changed(
        &self,
        snapshot: &SubscriptionSnapshot,
    ) -> Result<WebhookAction, DomainError> {
        let Some(uid) = resolve_subscriber(self.memberships.as_ref(), snapshot).await? else {
            return Ok(unresolved(snapshot));
        };
        let applied =
            apply_subscription(self.memberships.as_ref(), &uid, snapshot, Timestamp::now()).await?;
        Ok(WebhookAction::Subscription(applied))
    }

    async fn subscription_deleted(
        &self,
        snapshot: &SubscriptionSnapshot,
    ) -> Result<WebhookAction, DomainError> {
        let Some(uid) = resolve_subscriber(self.memberships.as_ref(), snapshot).await? else {
            return Ok(unresolved(snapshot));
        };
        let applied = downgrade(
            self.memberships.as_ref(),
            &uid,
            &snapshot.id,
            MembershipStatus::Canceled,
            Timestamp::now(),
        )
        .await?;
        Ok(WebhookAction::Subscription(applied))
    }

    async fn invoice_payment_failed(
        &self,
        invoice: &InvoicePaymentFailed,
    ) -> Result<WebhookAction, DomainError> {
        let member = match (&invoice.subscription_id, &invoice.customer_id) {
            (Some(sub), _) => self.memberships.find_by_subscription_id(sub).await?,
            (None, Some(customer)) => self.memberships.find_by_customer_id(customer).await?,
            (None, None) => None,
        };
        let Some(member) = member else {
            return Ok(ignored("invoice for unknown member"));
        };

        if self.memberships.mark_past_due(&member.uid, Timestamp::now()).await? {
            tracing::info!(uid = %member.uid, invoice_id = %invoice.invoice_id, "Member marked past due");
            Ok(WebhookAction::MarkedPastDue)
        } else {
            Ok(ignored("member not on creator_pro"))
        }
    }

    async fn charge_refunded(&self, charge: &ChargeRefunded) -> Result<WebhookAction, DomainError> {
        if !charge.fully_refunded {
            return Ok(ignored("partial refund"));
        }
        let Some(payment_intent) = charge.payment_intent_id.as_deref() else {
            return Ok(ignored("charge without payment intent"));
        };
        let Some(purchase) = self
            .entitlements
            .find_purchase_by_payment_intent(payment_intent)
            .await?
        else {
            return Ok(ignored("refund for unknown purchase"));
        };

        self.entitlements.mark_refunded(&purchase.id, Timestamp::now()).await?;
        tracing::info!(purchase_id = %purchase.id, "Purchase refunded");
        Ok(WebhookAction::PurchaseRefunded {
            purchase_id: purchase.id,
        })
    }

    async fn account_updated(&self, account: &AccountSnapshot) -> Result<WebhookAction, DomainError> {
        let creator_id = match account.creator_id.as_deref().filter(|c| !c.trim().is_empty()) {
            Some(id) => CreatorId::new(id)?,
            None => match self.accounts.find_by_account_id(&account.account_id).await? {
                Some(existing) => existing.creator_id,
                None => return Ok(ignored("account not linked to a creator")),
            },
        };

        let cached = ConnectedAccount::from_snapshot(creator_id.clone(), account, Timestamp::now());
        self.accounts.upsert(&cached).await?;
        Ok(WebhookAction::AccountRefreshed { creator_id })
    }
}

fn ignored(reason: impl Into<String>) -> WebhookAction {
    WebhookAction::Ignored {
        reason: reason.into(),
    }
}

fn unresolved(snapshot: &SubscriptionSnapshot) -> WebhookAction {
    // Redelivery cannot fix a missing user, so acknowledge.
    tracing::warn!(
        subscription_id = %snapshot.id,
        customer_id = %snapshot.customer_id,
        "Subscription event for unknown member"
    );
    ignored("subscription for unknown member")
}
