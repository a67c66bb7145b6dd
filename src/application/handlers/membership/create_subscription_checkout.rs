//! CreateSubscriptionCheckoutHandler - starts a creator_pro checkout.
//!
//! The membership is not changed here. It is upgraded when the
//! `checkout.session.completed` or `customer.subscription.*` webhook
//! arrives.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, ErrorCode, Timestamp, UserId};
use crate::ports::{CheckoutSession, MembershipStore, PaymentProvider, SubscriptionCheckoutRequest};

/// Where Stripe sends the member back to, and what they buy.
#[derive(Debug, Clone)]
pub struct SubscriptionCheckoutSettings {
    pub price_id: String,
    pub success_url: String,
    pub cancel_url: String,
    pub portal_return_url: String,
}

/// Command to create a subscription checkout session.
#[derive(Debug, Clone)]
pub struct CreateSubscriptionCheckoutCommand {
    pub uid: UserId,
    pub email: Option<String>,
}

pub struct CreateSubscriptionCheckoutHandler {
    store: Arc<dyn MembershipStore>,
    payment_provider: Arc<dyn PaymentProvider>,
    settings: SubscriptionCheckoutSettings,
}

impl CreateSubscriptionCheckoutHandler {
    pub fn new(
        store: Arc<dyn MembershipStore>,
        payment_provider: Arc<dyn PaymentProvider>,
        settings: SubscriptionCheckoutSettings,
    ) -> Self {
        Self {
            store,
            payment_provider,
            settings,
        }
    }

    pub async fn handle(
        &self,
        cmd: CreateSubscriptionCheckoutCommand,
    ) -> Result<CheckoutSession, DomainError> {
        let record = self
            .store
            .ensure(&cmd.uid, cmd.email.as_deref(), Timestamp::now())
            .await?;

        if record.is_creator_pro() {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                "Already subscribed to creator_pro",
            ));
        }

        let session = self
            .payment_provider
            .create_subscription_checkout(SubscriptionCheckoutRequest {
                uid: cmd.uid.clone(),
                email: cmd.email.or(record.email),
                customer_id: record.stripe_customer_id,
                price_id: self.settings.price_id.clone(),
                success_url: self.settings.success_url.clone(),
                cancel_url: self.settings.cancel_url.clone(),
            })
            .await?;

        tracing::info!(uid = %cmd.uid, session_id = %session.id, "Created subscription checkout");
        Ok(session)
    }
}
