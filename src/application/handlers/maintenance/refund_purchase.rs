//! RefundPurchaseHandler - operator-issued refunds.
//!
//! Only asks Stripe to refund. The purchase is marked refunded when the
//! `charge.refunded` webhook arrives, like refunds issued from the
//! Stripe dashboard.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, ErrorCode, PurchaseId};
use crate::domain::purchase::PurchaseStatus;
use crate::ports::{EntitlementStore, PaymentProvider, RefundReceipt};

pub struct RefundPurchaseHandler {
    entitlements: Arc<dyn EntitlementStore>,
    payment_provider: Arc<dyn PaymentProvider>,
}

impl RefundPurchaseHandler {
    pub fn new(entitlements: Arc<dyn EntitlementStore>, payment_provider: Arc<dyn PaymentProvider>) -> Self {
        Self {
            entitlements,
            payment_provider,
        }
    }

    pub async fn handle(&self, purchase_id: &PurchaseId) -> Result<RefundReceipt, DomainError> {
        let purchase = self
            .entitlements
            .find_purchase(purchase_id)
            .await?
            .ok_or_else(|| DomainError::not_found("purchase", purchase_id))?;

        if purchase.status != PurchaseStatus::Completed {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("Cannot refund a {} purchase", purchase.status.as_str()),
            ));
        }
        let payment_intent = purchase.payment_intent_id.as_deref().ok_or_else(|| {
            DomainError::validation("paymentIntentId", "Purchase has no payment intent")
        })?;

        let receipt = self
            .payment_provider
            .refund_payment(payment_intent, &format!("refund-{}", purchase.id))
            .await?;
        tracing::info!(
            purchase_id = %purchase.id,
            refund_id = %receipt.refund_id,
            status = %receipt.status,
            "Refund requested"
        );
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryEntitlementStore;
    use crate::adapters::stripe::MockPaymentProvider;
    use crate::domain::foundation::{ProductBoxId, Timestamp, UserId};
    use crate::domain::purchase::PurchaseRecord;

    fn purchase(status: PurchaseStatus, payment_intent: Option<&str>) -> PurchaseRecord {
        PurchaseRecord {
            id: PurchaseId::new("cs_123").unwrap(),
            buyer_uid: UserId::new("bob").unwrap(),
            creator_id: None,
            product_box_id: ProductBoxId::new("box_1").unwrap(),
            amount: 2999,
            currency: "usd".to_string(),
            status,
            payment_intent_id: payment_intent.map(String::from),
            purchased_at: Timestamp::now(),
            refunded_at: None,
        }
    }

    async fn handler(record: PurchaseRecord) -> (RefundPurchaseHandler, Arc<MockPaymentProvider>) {
        let store = Arc::new(InMemoryEntitlementStore::new());
        store.insert_orphan_purchase(record).await;
        let provider = Arc::new(MockPaymentProvider::new());
        (RefundPurchaseHandler::new(store, provider.clone()), provider)
    }

    #[tokio::test]
    async fn refunds_with_stable_idempotency_key() {
        let (handler, provider) = handler(purchase(PurchaseStatus::Completed, Some("pi_1"))).await;

        handler.handle(&PurchaseId::new("cs_123").unwrap()).await.unwrap();

        assert_eq!(
            provider.calls()[0].args,
            vec!["pi_1".to_string(), "refund-cs_123".to_string()]
        );
    }

    #[tokio::test]
    async fn refunded_purchase_is_rejected() {
        let (handler, provider) = handler(purchase(PurchaseStatus::Refunded, Some("pi_1"))).await;

        let err = handler.handle(&PurchaseId::new("cs_123").unwrap()).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::InvalidStateTransition);
        assert_eq!(provider.call_count("refund_payment"), 0);
    }

    #[tokio::test]
    async fn unknown_purchase_is_not_found() {
        let (handler, _) = handler(purchase(PurchaseStatus::Completed, None)).await;

        let err = handler.handle(&PurchaseId::new("cs_nope").unwrap()).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
