//! Applies a provider subscription snapshot to a membership record.
//!
//! Shared by the webhook reconciler and the operator resync so both use
//! the same status mapping.

use crate::domain::foundation::{DomainError, ErrorCode, Timestamp, UserId};
use crate::domain::membership::{BillingOutcome, CreatorProLink, MembershipStatus};
use crate::domain::payment::SubscriptionSnapshot;
use crate::ports::MembershipStore;

/// What applying a snapshot did to the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionApplied {
    /// Record now on creator_pro with this status.
    CreatorPro(MembershipStatus),
    /// Record moved to free with this status.
    Downgraded(MembershipStatus),
    /// Record was already free, or tracks a different subscription.
    Unchanged,
}

/// Finds the member a subscription belongs to.
///
/// `metadata.uid` wins; otherwise the member already linked to the
/// Stripe customer. Returns `None` when neither resolves.
pub async fn resolve_subscriber(
    store: &dyn MembershipStore,
    snapshot: &SubscriptionSnapshot,
) -> Result<Option<UserId>, DomainError> {
    if let Some(uid) = snapshot.uid.as_deref().filter(|u| !u.trim().is_empty()) {
        return Ok(Some(UserId::new(uid)?));
    }
    Ok(store
        .find_by_customer_id(&snapshot.customer_id)
        .await?
        .map(|record| record.uid))
}

/// Overwrites the member's billing state from `snapshot`.
///
/// Downgrades are skipped when the member is linked to a different
/// subscription, so a late event for an old subscription cannot cancel
/// a newer one.
pub async fn apply_subscription(
    store: &dyn MembershipStore,
    uid: &UserId,
    snapshot: &SubscriptionSnapshot,
    now: Timestamp,
) -> Result<SubscriptionApplied, DomainError> {
    match snapshot.status.billing_outcome() {
        BillingOutcome::CreatorPro(status) => {
            let link = CreatorProLink::new(
                snapshot.customer_id.clone(),
                snapshot.id.clone(),
                status,
                snapshot.current_period_end,
                snapshot.cancel_at_period_end,
            )?;
            store.upgrade_to_creator_pro(uid, &link, now).await?;
            Ok(SubscriptionApplied::CreatorPro(status))
        }
        BillingOutcome::Free(status) => downgrade(store, uid, &snapshot.id, status, now).await,
    }
}

/// Moves the member to free after their subscription ended.
///
/// A member who has since moved to another subscription is left as is.
pub async fn downgrade(
    store: &dyn MembershipStore,
    uid: &UserId,
    subscription_id: &str,
    status: MembershipStatus,
    now: Timestamp,
) -> Result<SubscriptionApplied, DomainError> {
    match store.downgrade_to_free(uid, subscription_id, status, now).await {
        Ok(true) => Ok(SubscriptionApplied::Downgraded(status)),
        Ok(false) => {
            tracing::info!(
                uid = %uid,
                event_subscription = subscription_id,
                "Downgrade left membership unchanged"
            );
            Ok(SubscriptionApplied::Unchanged)
        }
        Err(e) if e.code == ErrorCode::NotFound => Ok(SubscriptionApplied::Unchanged),
        Err(e) => Err(e),
    }
}
