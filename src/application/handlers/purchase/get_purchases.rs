//! Purchase queries for the buyer.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, PurchaseId, UserId};
use crate::domain::purchase::PurchaseRecord;
use crate::ports::EntitlementStore;

#[derive(Debug, Clone)]
pub struct ListPurchasesQuery {
    pub uid: UserId,
}

#[derive(Debug, Clone)]
pub struct GetPurchaseQuery {
    pub uid: UserId,
    pub purchase_id: PurchaseId,
}

/// Handler for the buyer's purchase history.
pub struct ListPurchasesHandler {
    store: Arc<dyn EntitlementStore>,
}

impl ListPurchasesHandler {
    pub fn new(store: Arc<dyn EntitlementStore>) -> Self {
        Self { store }
    }

    pub async fn handle(&self, query: ListPurchasesQuery) -> Result<Vec<PurchaseRecord>, DomainError> {
        self.store.list_purchases(&query.uid).await
    }
}

/// Handler for a single purchase.
///
/// Another buyer's purchase is reported as not found.
pub struct GetPurchaseHandler {
    store: Arc<dyn EntitlementStore>,
}

impl GetPurchaseHandler {
    pub fn new(store: Arc<dyn EntitlementStore>) -> Self {
        Self { store }
    }

    pub async fn handle(&self, query: GetPurchaseQuery) -> Result<PurchaseRecord, DomainError> {
        self.store
            .find_purchase(&query.purchase_id)
            .await?
            .filter(|purchase| purchase.buyer_uid == query.uid)
            .ok_or_else(|| DomainError::not_found("purchase", &query.purchase_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryEntitlementStore;
    use crate::domain::foundation::{ErrorCode, ProductBoxId, Timestamp};
    use crate::domain::purchase::PurchaseStatus;

    fn purchase(id: &str, buyer: &str, secs: i64) -> PurchaseRecord {
        PurchaseRecord {
            id: PurchaseId::new(id).unwrap(),
            buyer_uid: UserId::new(buyer).unwrap(),
            creator_id: None,
            product_box_id: ProductBoxId::new(format!("box_{}", id)).unwrap(),
            amount: 500,
            currency: "usd".to_string(),
            status: PurchaseStatus::Completed,
            payment_intent_id: None,
            purchased_at: Timestamp::from_unix_secs(secs).unwrap(),
            refunded_at: None,
        }
    }

    async fn seeded() -> Arc<InMemoryEntitlementStore> {
        let store = Arc::new(InMemoryEntitlementStore::new());
        store.insert_orphan_purchase(purchase("cs_1", "bob", 1_700_000_000)).await;
        store.insert_orphan_purchase(purchase("cs_2", "bob", 1_700_000_500)).await;
        store.insert_orphan_purchase(purchase("cs_3", "eve", 1_700_000_900)).await;
        store
    }

    #[tokio::test]
    async fn lists_only_own_purchases_newest_first() {
        let handler = ListPurchasesHandler::new(seeded().await);

        let purchases = handler
            .handle(ListPurchasesQuery {
                uid: UserId::new("bob").unwrap(),
            })
            .await
            .unwrap();

        let ids: Vec<_> = purchases.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["cs_2", "cs_1"]);
    }

    #[tokio::test]
    async fn other_buyers_purchase_is_not_found() {
        let handler = GetPurchaseHandler::new(seeded().await);

        let err = handler
            .handle(GetPurchaseQuery {
                uid: UserId::new("bob").unwrap(),
                purchase_id: PurchaseId::new("cs_3").unwrap(),
            })
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
