//! ResyncMembershipHandler - re-applies Stripe subscription state.
//!
//! For repairing a member whose webhook was lost or failed permanently.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, ErrorCode, Timestamp, UserId};
use crate::domain::membership::{MembershipRecord, MembershipStatus};
use crate::ports::{MembershipStore, PaymentProvider};

use super::super::membership::{apply_subscription, downgrade, SubscriptionApplied};

#[derive(Debug, Clone)]
pub struct ResyncMembershipResult {
    pub applied: SubscriptionApplied,
    pub membership: MembershipRecord,
}

pub struct ResyncMembershipHandler {
    store: Arc<dyn MembershipStore>,
    payment_provider: Arc<dyn PaymentProvider>,
}

impl ResyncMembershipHandler {
    pub fn new(store: Arc<dyn MembershipStore>, payment_provider: Arc<dyn PaymentProvider>) -> Self {
        Self {
            store,
            payment_provider,
        }
    }

    pub async fn handle(&self, uid: &UserId) -> Result<ResyncMembershipResult, DomainError> {
        let record = self
            .store
            .find(uid)
            .await?
            .ok_or_else(|| DomainError::not_found("membership", uid))?;
        let subscription_id = record.stripe_subscription_id.clone().ok_or_else(|| {
            DomainError::new(
                ErrorCode::InvalidStateTransition,
                "Member has no linked subscription",
            )
        })?;

        let now = Timestamp::now();
        let applied = match self
            .payment_provider
            .retrieve_subscription(&subscription_id)
            .await?
        {
            Some(snapshot) => apply_subscription(self.store.as_ref(), uid, &snapshot, now).await?,
            // Stripe no longer knows the subscription: treat it as ended.
            None => {
                downgrade(self.store.as_ref(), uid, &subscription_id, MembershipStatus::Canceled, now)
                    .await?
            }
        };

        tracing::info!(uid = %uid, subscription_id = %subscription_id, applied = ?applied, "Membership resynced");
        let membership = self
            .store
            .find(uid)
            .await?
            .ok_or_else(|| DomainError::not_found("membership", uid))?;
        Ok(ResyncMembershipResult { applied, membership })
    }
}
