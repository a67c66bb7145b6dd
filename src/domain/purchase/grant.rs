//! Purchase grants: the only input the entitlement store accepts.
//!
//! A `PurchaseGrant` bundles the purchase record and the access grant that
//! must be written together. It can only be derived from a
//! `VerifiedEvent`, so nothing outside signature-checked webhook handling
//! can create purchases or grant access.

use crate::domain::foundation::{
    CreatorId, DomainError, ProductBoxId, PurchaseId, Timestamp, UserId,
};
use crate::domain::payment::{CheckoutCompleted, CheckoutMode, PaymentEvent, VerifiedEvent};

use super::{AccessGrant, PurchaseRecord, PurchaseStatus};

/// Purchase plus grant, ready to be written atomically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseGrant {
    purchase: PurchaseRecord,
    grant: AccessGrant,
}

impl PurchaseGrant {
    /// Derives the grant for a paid one-time checkout.
    ///
    /// Returns `Ok(None)` for events that don't create purchases (other
    /// event types, subscription checkouts, unpaid sessions).
    pub fn from_verified(event: &VerifiedEvent) -> Result<Option<Self>, DomainError> {
        match event.event() {
            PaymentEvent::CheckoutCompleted(checkout)
                if checkout.mode == CheckoutMode::Payment && checkout.paid =>
            {
                Self::from_checkout(checkout, event.created()).map(Some)
            }
            _ => Ok(None),
        }
    }

    fn from_checkout(checkout: &CheckoutCompleted, purchased_at: Timestamp) -> Result<Self, DomainError> {
        let id = PurchaseId::new(checkout.session_id.clone())?;
        let buyer_uid = UserId::new(checkout.buyer_uid.clone().unwrap_or_default())?;
        let product_box_id = ProductBoxId::new(checkout.product_box_id.clone().unwrap_or_default())?;
        let creator_id = checkout
            .creator_id
            .clone()
            .filter(|c| !c.trim().is_empty())
            .map(CreatorId::new)
            .transpose()?;

        let amount = checkout
            .amount_total
            .ok_or_else(|| DomainError::validation("amount_total", "checkout has no amount"))?;
        if amount < 0 {
            return Err(DomainError::validation("amount_total", "amount cannot be negative"));
        }
        let currency = checkout
            .currency
            .as_deref()
            .map(str::to_ascii_lowercase)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| DomainError::validation("currency", "checkout has no currency"))?;

        let purchase = PurchaseRecord {
            id: id.clone(),
            buyer_uid: buyer_uid.clone(),
            creator_id,
            product_box_id: product_box_id.clone(),
            amount,
            currency,
            status: PurchaseStatus::Completed,
            payment_intent_id: checkout.payment_intent_id.clone(),
            purchased_at,
            refunded_at: None,
        };
        let grant = AccessGrant {
            buyer_uid,
            product_box_id,
            purchase_id: id,
            granted_at: purchased_at,
        };
        Ok(Self { purchase, grant })
    }

    pub fn purchase(&self) -> &PurchaseRecord {
        &self.purchase
    }

    pub fn grant(&self) -> &AccessGrant {
        &self.grant
    }
}
