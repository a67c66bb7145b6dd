//! GrantAccessHandler - the entitlement recorder.
//!
//! Turns a verified one-time checkout into a purchase record plus access
//! grant. Only the webhook reconciler calls this, and it can only do so
//! with a `VerifiedEvent` in hand.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, PurchaseId};
use crate::domain::payment::VerifiedEvent;
use crate::domain::purchase::PurchaseGrant;
use crate::ports::{EntitlementStore, SaveResult};

/// Result of recording a purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantAccessResult {
    /// New purchase and grant written.
    Granted { purchase_id: PurchaseId },
    /// Purchase existed already. Counts as success.
    AlreadyGranted { purchase_id: PurchaseId },
    /// Event doesn't represent a paid one-time purchase.
    NotAPurchase,
}

pub struct GrantAccessHandler {
    store: Arc<dyn EntitlementStore>,
}

impl GrantAccessHandler {
    pub fn new(store: Arc<dyn EntitlementStore>) -> Self {
        Self { store }
    }

    pub async fn handle(&self, event: &VerifiedEvent) -> Result<GrantAccessResult, DomainError> {
        let Some(grant) = PurchaseGrant::from_verified(event)? else {
            return Ok(GrantAccessResult::NotAPurchase);
        };
        let purchase = grant.purchase();

        match self.store.record_purchase(&grant).await {
            Ok(SaveResult::Inserted) => {
                tracing::info!(
                    event_id = %event.id(),
                    purchase_id = %purchase.id,
                    buyer_uid = %purchase.buyer_uid,
                    product_box_id = %purchase.product_box_id,
                    amount = purchase.amount,
                    "Purchase recorded"
                );
                Ok(GrantAccessResult::Granted {
                    purchase_id: purchase.id.clone(),
                })
            }
            Ok(SaveResult::AlreadyExists) => {
                tracing::debug!(purchase_id = %purchase.id, "Purchase already recorded");
                Ok(GrantAccessResult::AlreadyGranted {
                    purchase_id: purchase.id.clone(),
                })
            }
            Err(e) => {
                tracing::error!(
                    event_id = %event.id(),
                    purchase_id = %purchase.id,
                    error = %e,
                    "Failed to record purchase"
                );
                Err(e)
            }
        }
    }
}
