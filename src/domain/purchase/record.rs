//! Purchase record and access grant.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    CreatorId, DomainError, ErrorCode, ProductBoxId, PurchaseId, StateMachine, Timestamp, UserId,
};

use super::PurchaseStatus;

/// Durable log entry of a completed one-time checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRecord {
    /// Stripe checkout session id.
    pub id: PurchaseId,
    pub buyer_uid: UserId,
    pub creator_id: Option<CreatorId>,
    pub product_box_id: ProductBoxId,
    /// Minor currency units.
    pub amount: i64,
    /// Lowercase ISO 4217 code.
    pub currency: String,
    pub status: PurchaseStatus,
    pub payment_intent_id: Option<String>,
    pub purchased_at: Timestamp,
    pub refunded_at: Option<Timestamp>,
}

impl PurchaseRecord {
    /// Marks the purchase refunded.
    ///
    /// Returns false if it already was. Failed purchases cannot be refunded.
    pub fn refund(&mut self, now: Timestamp) -> Result<bool, DomainError> {
        if self.status == PurchaseStatus::Refunded {
            return Ok(false);
        }
        self.status = self
            .status
            .transition_to(PurchaseStatus::Refunded)
            .map_err(|e| DomainError::new(ErrorCode::InvalidStateTransition, e.to_string()))?;
        self.refunded_at = Some(now);
        Ok(true)
    }
}

/// Buyer's entitlement to one bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessGrant {
    pub buyer_uid: UserId,
    pub product_box_id: ProductBoxId,
    /// Purchase that created the grant.
    pub purchase_id: PurchaseId,
    pub granted_at: Timestamp,
}
